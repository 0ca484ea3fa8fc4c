//! Blog directory pings.
//!
//! Sends an XML-RPC `weblogUpdates.ping(title, link)` to every configured
//! directory when a watched page is written.
//!
//! ```toml
//! [[publish]]
//! plugin = "ping"
//! urls = ["http://ping.blo.gs:80/", "http://rpc.pingomatic.com/"]
//! watch = ["index"]
//! ```

use std::sync::Arc;
use std::time::Duration;

use hobix_plugin::{
    PluginError, PublishError, PublishEvent, PublishPlugin, WatchSet, WeblogInfo,
};
use quick_xml::escape::{escape, resolve_predefined_entity};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde::Deserialize;
use ureq::Agent;

/// Plugin name.
pub const NAME: &str = "ping";

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PingSettings {
    urls: Vec<String>,
    watch: Vec<String>,
    timeout_secs: u64,
}

impl Default for PingSettings {
    fn default() -> Self {
        Self {
            urls: vec!["http://ping.blo.gs:80/".to_owned()],
            watch: vec!["index".to_owned()],
            timeout_secs: DEFAULT_TIMEOUT,
        }
    }
}

/// Pings blog directories.
pub struct PingPublisher {
    agent: Agent,
    weblog: Arc<WeblogInfo>,
    urls: Vec<String>,
    watch: WatchSet,
}

impl PingPublisher {
    /// Construct from the plugin's configuration table.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidConfig`] for unknown fields, a bad watch
    /// key, or an empty URL list.
    pub fn from_settings(
        weblog: Arc<WeblogInfo>,
        settings: &serde_json::Value,
    ) -> Result<Self, PluginError> {
        let settings: PingSettings = if settings.is_null() {
            PingSettings::default()
        } else {
            serde_json::from_value(settings.clone()).map_err(|e| PluginError::InvalidConfig {
                plugin: NAME.to_owned(),
                message: e.to_string(),
            })?
        };
        if settings.urls.is_empty() {
            return Err(PluginError::InvalidConfig {
                plugin: NAME.to_owned(),
                message: "at least one URL is required".to_owned(),
            });
        }

        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Ok(Self {
            agent,
            weblog,
            urls: settings.urls,
            watch: WatchSet::parse(NAME, &settings.watch)?,
        })
    }

    fn ping(&self, url: &str, body: &str) -> Result<(), PublishError> {
        let http_error = |message: String| PublishError::Http {
            url: url.to_owned(),
            message,
        };

        let response = self
            .agent
            .post(url)
            .header("Content-Type", "text/xml")
            .header("User-Agent", concat!("Hobix/", env!("CARGO_PKG_VERSION")))
            .send(body)
            .map_err(|e| http_error(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .into_body()
            .read_to_string()
            .map_err(|e| http_error(e.to_string()))?;

        if status >= 400 {
            return Err(PublishError::Rejected {
                url: url.to_owned(),
                message: format!("HTTP {status}"),
            });
        }

        let reply = parse_response(&text).map_err(|message| PublishError::Rejected {
            url: url.to_owned(),
            message,
        })?;
        if reply.error {
            return Err(PublishError::Rejected {
                url: url.to_owned(),
                message: reply.message,
            });
        }
        tracing::debug!(url, message = %reply.message, "Ping accepted");
        Ok(())
    }
}

/// Constructor used by the plugin descriptor.
pub(crate) fn construct(
    weblog: Arc<WeblogInfo>,
    settings: &serde_json::Value,
) -> Result<Box<dyn PublishPlugin>, PluginError> {
    Ok(Box::new(PingPublisher::from_settings(weblog, settings)?))
}

impl PublishPlugin for PingPublisher {
    fn name(&self) -> &str {
        NAME
    }

    fn watch(&self) -> &WatchSet {
        &self.watch
    }

    /// Pings every directory; a failing directory does not stop the others.
    /// The first failure is returned.
    fn publish(&mut self, event: &PublishEvent) -> Result<(), PublishError> {
        let body = request_body(&self.weblog);
        let mut first_error = None;
        for url in &self.urls {
            tracing::info!(url, page = %event.page_id, "Pinging blog directory");
            if let Err(e) = self.ping(url, &body) {
                tracing::warn!(url, error = %e, "Ping failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// XML-RPC request body for `weblogUpdates.ping`.
fn request_body(weblog: &WeblogInfo) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n\
         <methodCall>\
         <methodName>weblogUpdates.ping</methodName>\
         <params>\
         <param><value><string>{}</string></value></param>\
         <param><value><string>{}</string></value></param>\
         </params>\
         </methodCall>\n",
        escape(weblog.title.as_str()),
        escape(weblog.link.as_str())
    )
}

/// Decoded directory reply.
#[derive(Debug, Default, PartialEq, Eq)]
struct PingReply {
    error: bool,
    message: String,
}

/// Read `flerror`/`message` (or `faultString` of a fault) from a reply.
fn parse_response(xml: &str) -> Result<PingReply, String> {
    let mut reader = Reader::from_str(xml);

    let mut reply = PingReply::default();
    let mut tag = String::new();
    let mut member = String::new();
    let mut name = String::new();

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => {
                tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match tag.as_str() {
                    "fault" => reply.error = true,
                    "name" => name.clear(),
                    _ => {}
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"name" {
                    member = std::mem::take(&mut name);
                }
                tag.clear();
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e).map_err(|e| e.to_string())?;
                push_member_text(&mut reply, &tag, &member, &mut name, &text);
            }
            Event::GeneralRef(e) => {
                let entity = reader.decoder().decode(&e).map_err(|e| e.to_string())?;
                let text = resolve_entity(&entity);
                push_member_text(&mut reply, &tag, &member, &mut name, &text);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(reply)
}

fn resolve_entity(entity: &str) -> String {
    if let Some(code) = entity.strip_prefix('#') {
        let code = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse().ok(),
        };
        return code.and_then(char::from_u32).map(String::from).unwrap_or_default();
    }
    resolve_predefined_entity(entity)
        .unwrap_or_default()
        .to_owned()
}

fn push_member_text(
    reply: &mut PingReply,
    tag: &str,
    member: &str,
    name: &mut String,
    text: &str,
) {
    match tag {
        "name" => name.push_str(text),
        "value" | "string" | "boolean" | "int" | "i4" => match member {
            "flerror" => reply.error |= matches!(text.trim(), "1" | "true"),
            "message" | "faultString" => reply.message.push_str(text),
            _ => {}
        },
        // Whitespace between elements
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use hobix_plugin::PageCategory;
    use pretty_assertions::assert_eq;

    use super::*;

    fn weblog() -> Arc<WeblogInfo> {
        Arc::new(WeblogInfo {
            title: "Tom & Jerry".to_owned(),
            link: "https://example.org/".to_owned(),
            ..WeblogInfo::default()
        })
    }

    fn event() -> PublishEvent {
        PublishEvent {
            category: PageCategory::Index,
            page_id: "index.html".to_owned(),
        }
    }

    /// Serve one HTTP response and hand back the request it answered.
    fn serve_once(status: &str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/RPC2", listener.local_addr().unwrap());
        let status = status.to_owned();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !String::from_utf8_lossy(&request).contains("</methodCall>") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: text/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            String::from_utf8(request).unwrap()
        });
        (url, handle)
    }

    fn publisher(urls: &[String]) -> PingPublisher {
        PingPublisher::from_settings(weblog(), &serde_json::json!({ "urls": urls })).unwrap()
    }

    const ACCEPTED: &str = "<?xml version=\"1.0\"?><methodResponse><params><param><value><struct>\
        <member><name>flerror</name><value><boolean>0</boolean></value></member>\
        <member><name>message</name><value><string>Thanks for the ping.</string></value></member>\
        </struct></value></param></params></methodResponse>";

    const REFUSED: &str = "<?xml version=\"1.0\"?><methodResponse><params><param><value><struct>\
        <member><name>flerror</name><value><boolean>1</boolean></value></member>\
        <member><name>message</name><value>Go away &amp; stay away</value></member>\
        </struct></value></param></params></methodResponse>";

    #[test]
    fn test_request_body_escapes_weblog() {
        let body = request_body(&weblog());
        assert!(body.contains("<methodName>weblogUpdates.ping</methodName>"));
        assert!(body.contains("<string>Tom &amp; Jerry</string>"));
        assert!(body.contains("<string>https://example.org/</string>"));
    }

    #[test]
    fn test_parse_response_accepted() {
        assert_eq!(
            parse_response(ACCEPTED).unwrap(),
            PingReply {
                error: false,
                message: "Thanks for the ping.".to_owned(),
            }
        );
    }

    #[test]
    fn test_parse_response_refused() {
        assert_eq!(
            parse_response(REFUSED).unwrap(),
            PingReply {
                error: true,
                message: "Go away & stay away".to_owned(),
            }
        );
    }

    #[test]
    fn test_parse_response_fault() {
        let xml = "<methodResponse><fault><value><struct>\
            <member><name>faultCode</name><value><int>4</int></value></member>\
            <member><name>faultString</name><value><string>Too many parameters</string></value></member>\
            </struct></value></fault></methodResponse>";
        let reply = parse_response(xml).unwrap();
        assert!(reply.error);
        assert_eq!(reply.message, "Too many parameters");
    }

    #[test]
    fn test_parse_response_ignores_layout_whitespace() {
        let xml = "<methodResponse>\n  <params><param><value><struct>\n    \
            <member>\n      <name>flerror</name>\n      <value><boolean>0</boolean></value>\n    </member>\n    \
            <member>\n      <name>message</name>\n      <value>It&#39;s ok</value>\n    </member>\n  \
            </struct></value></param></params>\n</methodResponse>\n";
        assert_eq!(
            parse_response(xml).unwrap(),
            PingReply {
                error: false,
                message: "It's ok".to_owned(),
            }
        );
    }

    #[test]
    fn test_default_settings() {
        let plugin = PingPublisher::from_settings(weblog(), &serde_json::Value::Null).unwrap();
        assert_eq!(plugin.urls, vec!["http://ping.blo.gs:80/".to_owned()]);
        assert!(plugin.watch().matches(&event()));
        assert!(!plugin.watch().matches(&PublishEvent {
            category: PageCategory::Entry,
            page_id: "a/1.html".to_owned(),
        }));
    }

    #[test]
    fn test_invalid_settings() {
        let err = PingPublisher::from_settings(weblog(), &serde_json::json!({ "urls": [] }))
            .err()
            .unwrap();
        assert!(err.to_string().contains("at least one URL"));

        let err = PingPublisher::from_settings(weblog(), &serde_json::json!({ "uris": ["x"] }))
            .err()
            .unwrap();
        assert!(matches!(err, PluginError::InvalidConfig { .. }));

        let err = PingPublisher::from_settings(weblog(), &serde_json::json!({ "watch": ["weekly"] }))
            .err()
            .unwrap();
        assert!(err.to_string().contains("weekly"));
    }

    #[test]
    fn test_publish_posts_ping() {
        let (url, server) = serve_once("200 OK", ACCEPTED);
        let mut plugin = publisher(&[url]);

        plugin.publish(&event()).unwrap();

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /RPC2 "));
        assert!(request.contains("<string>Tom &amp; Jerry</string>"));
    }

    #[test]
    fn test_publish_refused_is_rejected() {
        let (url, server) = serve_once("200 OK", REFUSED);
        let mut plugin = publisher(&[url]);

        let err = plugin.publish(&event()).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, PublishError::Rejected { ref message, .. } if message == "Go away & stay away"));
    }

    #[test]
    fn test_publish_http_status_is_rejected() {
        let (url, server) = serve_once("503 Service Unavailable", "");
        let mut plugin = publisher(&[url]);

        let err = plugin.publish(&event()).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, PublishError::Rejected { ref message, .. } if message == "HTTP 503"));
    }

    #[test]
    fn test_unreachable_directory_does_not_stop_others() {
        let closed = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}/", listener.local_addr().unwrap())
        };
        let (url, server) = serve_once("200 OK", ACCEPTED);
        let mut plugin = publisher(&[closed.clone(), url]);

        let err = plugin.publish(&event()).unwrap_err();
        assert!(matches!(err, PublishError::Http { url, .. } if url == closed));
        // The second directory was still pinged
        assert!(server.join().unwrap().contains("weblogUpdates.ping"));
    }
}
