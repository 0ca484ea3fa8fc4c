//! Publish dispatch.

use std::collections::HashSet;

use hobix_plugin::{PublishEvent, PublishPlugin};
use rayon::prelude::*;

use crate::report::PublishFailure;

/// Result of notifying publish plugins.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Successful `publish` calls.
    pub notified: usize,
    /// Failed calls, in plugin order then page order.
    pub failures: Vec<PublishFailure>,
}

/// Notify every plugin of the written pages its watch set matches.
///
/// Each plugin is called at most once per page id. A failure is recorded and
/// dispatch carries on with the next page. With `parallel`, different plugins
/// run concurrently; one plugin always sees its pages in order.
pub fn dispatch(
    publishers: &mut [Box<dyn PublishPlugin>],
    written: &[PublishEvent],
    parallel: bool,
) -> DispatchOutcome {
    let outcomes: Vec<DispatchOutcome> = if parallel {
        publishers
            .par_iter_mut()
            .map(|plugin| notify(plugin.as_mut(), written))
            .collect()
    } else {
        publishers
            .iter_mut()
            .map(|plugin| notify(plugin.as_mut(), written))
            .collect()
    };

    outcomes
        .into_iter()
        .fold(DispatchOutcome::default(), |mut acc, outcome| {
            acc.notified += outcome.notified;
            acc.failures.extend(outcome.failures);
            acc
        })
}

fn notify(plugin: &mut dyn PublishPlugin, written: &[PublishEvent]) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    let mut seen = HashSet::new();
    for event in written {
        if !plugin.watch().matches(event) || !seen.insert(event.page_id.as_str()) {
            continue;
        }
        match plugin.publish(event) {
            Ok(()) => {
                tracing::debug!(plugin = plugin.name(), page = %event.page_id, "Published");
                outcome.notified += 1;
            }
            Err(error) => {
                tracing::warn!(plugin = plugin.name(), page = %event.page_id, %error, "Publish failed");
                outcome.failures.push(PublishFailure {
                    plugin: plugin.name().to_owned(),
                    page_id: event.page_id.clone(),
                    error,
                });
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use hobix_plugin::{PageCategory, PublishError, WatchKey, WatchSet};
    use pretty_assertions::assert_eq;

    use super::*;

    struct Recorder {
        name: &'static str,
        watch: WatchSet,
        seen: Arc<Mutex<Vec<String>>>,
        fail_on: Option<&'static str>,
    }

    impl PublishPlugin for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn watch(&self) -> &WatchSet {
            &self.watch
        }

        fn publish(&mut self, event: &PublishEvent) -> Result<(), PublishError> {
            self.seen.lock().unwrap().push(event.page_id.clone());
            if self.fail_on == Some(event.page_id.as_str()) {
                return Err(PublishError::Io(std::io::Error::other("boom")));
            }
            Ok(())
        }
    }

    fn recorder(
        name: &'static str,
        keys: Vec<WatchKey>,
        fail_on: Option<&'static str>,
    ) -> (Box<dyn PublishPlugin>, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let plugin = Recorder {
            name,
            watch: WatchSet::new(keys),
            seen: Arc::clone(&seen),
            fail_on,
        };
        (Box::new(plugin), seen)
    }

    fn event(category: PageCategory, page_id: &str) -> PublishEvent {
        PublishEvent {
            category,
            page_id: page_id.to_owned(),
        }
    }

    fn written() -> Vec<PublishEvent> {
        vec![
            event(PageCategory::Index, "index.html"),
            event(PageCategory::Entry, "a/1.html"),
            event(PageCategory::Index, "index.html"),
            event(PageCategory::Tag, "tags/x/index.html"),
        ]
    }

    #[test]
    fn test_once_per_matching_page() {
        for parallel in [false, true] {
            let (index, index_seen) = recorder("index", vec![WatchKey::Category(PageCategory::Index)], None);
            let (all, all_seen) = recorder("all", vec![WatchKey::All], None);
            let mut publishers = vec![index, all];

            let outcome = dispatch(&mut publishers, &written(), parallel);

            assert_eq!(outcome.notified, 4);
            assert!(outcome.failures.is_empty());
            assert_eq!(*index_seen.lock().unwrap(), vec!["index.html"]);
            assert_eq!(
                *all_seen.lock().unwrap(),
                vec!["index.html", "a/1.html", "tags/x/index.html"]
            );
        }
    }

    #[test]
    fn test_failure_is_isolated() {
        let (failing, failing_seen) = recorder("failing", vec![WatchKey::All], Some("index.html"));
        let (other, other_seen) = recorder("other", vec![WatchKey::Prefix("a/".to_owned())], None);
        let mut publishers = vec![failing, other];

        let outcome = dispatch(&mut publishers, &written(), true);

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].plugin, "failing");
        assert_eq!(outcome.failures[0].page_id, "index.html");
        // Later pages still reach the failing plugin, and other plugins are unaffected
        assert_eq!(failing_seen.lock().unwrap().len(), 3);
        assert_eq!(*other_seen.lock().unwrap(), vec!["a/1.html"]);
        assert_eq!(outcome.notified, 3);
    }

    #[test]
    fn test_no_publishers() {
        let outcome = dispatch(&mut [], &written(), true);
        assert_eq!(outcome.notified, 0);
    }
}
