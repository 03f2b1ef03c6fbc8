// Operational command endpoints
//
// `type=op` commands, given either as XML or as CLI-style text converted
// by `cmd_xml`, plus `type=user-id` mapping updates.

use tracing::debug;

use crate::error::Error;
use crate::transport::Transport;
use crate::xapi::client::XapiClient;

/// Convert a CLI-style command to the XML form `type=op` expects.
///
/// Bare words become nested elements; a double-quoted word becomes the
/// text of the innermost element:
/// `show jobs id "4"` → `<show><jobs><id>4</id></jobs></show>`.
pub fn cmd_xml(cmd: &str) -> String {
    let mut xml = String::new();
    let mut open: Vec<&str> = Vec::new();

    for word in cmd.split_whitespace() {
        match word.strip_prefix('"').and_then(|w| w.strip_suffix('"')) {
            Some(text) => xml.push_str(&quick_xml::escape::escape(text)),
            None => {
                xml.push('<');
                xml.push_str(word);
                xml.push('>');
                open.push(word);
            }
        }
    }

    for word in open.iter().rev() {
        xml.push_str("</");
        xml.push_str(word);
        xml.push('>');
    }
    xml
}

impl<T: Transport> XapiClient<T> {
    /// Run an operational command.
    ///
    /// `cmd` is XML unless `cmd_xml` is set, in which case it is CLI
    /// text passed through [`cmd_xml`] first.
    pub async fn op(
        &mut self,
        cmd: Option<&str>,
        vsys: Option<&str>,
        cmd_xml: bool,
    ) -> Result<(), Error> {
        let cmd = match cmd {
            Some(cmd) if cmd_xml => Some(self::cmd_xml(cmd)),
            other => other.map(String::from),
        };
        let mut request = self.authed_request("op").await?;
        request.push_opt("cmd", cmd.as_deref());
        request.push_opt("vsys", vsys);
        debug!(cmd = ?cmd, "op request");
        self.execute(&request).await
    }

    /// Send a `<uid-message>` document (login/logout, tag register and
    /// unregister). Per-entry failures surface as `key: value` lines.
    pub async fn user_id(&mut self, cmd: Option<&str>, vsys: Option<&str>) -> Result<(), Error> {
        let mut request = self.authed_request("user-id").await?;
        request.push_opt("cmd", cmd);
        request.push_opt("vsys", vsys);
        self.execute(&request).await
    }
}
