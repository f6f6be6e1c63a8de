//! Built-in Junos resources.
//!
//! Each module holds one resource struct implementing
//! [`ResourceData`](crate::provider::ResourceData): its schema, cross-field
//! checks, the `set` lines it produces and the parsing of `display set
//! relative` output back into the struct.

pub mod application;
pub mod policyoptions_as_path;
pub mod policyoptions_community;
pub mod policyoptions_prefix_list;
pub mod routing_instance;
pub mod security_address_book;
pub mod security_nat_destination_pool;
pub mod snmp_community;
pub mod static_route;
pub mod vlan;

pub use application::Application;
pub use policyoptions_as_path::PolicyoptionsAsPath;
pub use policyoptions_community::PolicyoptionsCommunity;
pub use policyoptions_prefix_list::PolicyoptionsPrefixList;
pub use routing_instance::RoutingInstance;
pub use security_address_book::SecurityAddressBook;
pub use security_nat_destination_pool::SecurityNatDestinationPool;
pub use snmp_community::SnmpCommunity;
pub use static_route::StaticRoute;
pub use vlan::Vlan;

use crate::error::Result;
use crate::junos::{display_set_lines, Session, CMD_SHOW_CONFIG, DEFAULT_W, PIPE_DISPLAY_SET};
use crate::provider::ResourceRegistry;

/// Register every built-in resource
pub fn register_builtins(registry: &mut ResourceRegistry) {
    registry.register_data::<Application>();
    registry.register_data::<PolicyoptionsAsPath>();
    registry.register_data::<PolicyoptionsCommunity>();
    registry.register_data::<PolicyoptionsPrefixList>();
    registry.register_data::<RoutingInstance>();
    registry.register_data::<SecurityAddressBook>();
    registry.register_data::<SecurityNatDestinationPool>();
    registry.register_data::<SnmpCommunity>();
    registry.register_data::<StaticRoute>();
    registry.register_data::<Vlan>();
}

/// Whether the routing instance `name` is configured; `default` always is.
pub(crate) async fn routing_instance_exists(sess: &dyn Session, name: &str) -> Result<bool> {
    if name == DEFAULT_W {
        return Ok(true);
    }
    let output = sess
        .command(&format!(
            "{}routing-instances {}{}",
            CMD_SHOW_CONFIG, name, PIPE_DISPLAY_SET
        ))
        .await?;
    let found = display_set_lines(&output).next().is_some();
    Ok(found)
}

/// `Some(true)` flags
pub(crate) fn is_set(flag: &Option<bool>) -> bool {
    flag.unwrap_or(false)
}

/// Names appearing more than once, in first-seen order
pub(crate) fn duplicates<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = std::collections::HashSet::new();
    let mut dups = Vec::new();
    for name in names {
        if !seen.insert(name) && !dups.contains(&name) {
            dups.push(name);
        }
    }
    dups
}
