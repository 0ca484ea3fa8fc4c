//! Built-in publish plugins for the Hobix weblog engine.
//!
//! - [`PingPublisher`] (`ping`): XML-RPC `weblogUpdates.ping` to blog directories
//! - [`CommandPublisher`] (`command`): runs an external command per page

mod command;
mod ping;

use hobix_plugin::PublishDescriptor;

pub use command::CommandPublisher;
pub use ping::PingPublisher;

/// Descriptors for every built-in publish plugin.
#[must_use]
pub fn descriptors() -> Vec<PublishDescriptor> {
    vec![
        PublishDescriptor {
            name: ping::NAME,
            construct: ping::construct,
        },
        PublishDescriptor {
            name: command::NAME,
            construct: command::construct,
        },
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hobix_plugin::WeblogInfo;

    use super::*;

    #[test]
    fn test_descriptors_construct_named_plugins() {
        let weblog = Arc::new(WeblogInfo::default());
        let settings = serde_json::json!({ "command": "true" });
        for descriptor in descriptors() {
            let settings = if descriptor.name == "command" {
                settings.clone()
            } else {
                serde_json::Value::Null
            };
            let plugin = (descriptor.construct)(Arc::clone(&weblog), &settings).unwrap();
            assert_eq!(plugin.name(), descriptor.name);
        }
    }
}
