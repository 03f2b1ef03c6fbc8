// Configuration endpoints
//
// `type=config` actions against an xpath, and `type=multi-config` for
// batches of actions applied in one request.

use tracing::debug;

use crate::error::Error;
use crate::transport::Transport;
use crate::xapi::client::XapiClient;

/// `action=` values accepted by `type=config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    Show,
    Get,
    Set,
    Edit,
    Delete,
    Move,
    Rename,
    Clone,
    Override,
}

impl ConfigAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Get => "get",
            Self::Set => "set",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Move => "move",
            Self::Rename => "rename",
            Self::Clone => "clone",
            Self::Override => "override",
        }
    }
}

impl std::fmt::Display for ConfigAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<T: Transport> XapiClient<T> {
    /// Active configuration at `xpath`.
    pub async fn show(&mut self, xpath: Option<&str>) -> Result<(), Error> {
        self.config_action(ConfigAction::Show, &[("xpath", xpath)]).await
    }

    /// Candidate configuration at `xpath`.
    pub async fn get(&mut self, xpath: Option<&str>) -> Result<(), Error> {
        self.config_action(ConfigAction::Get, &[("xpath", xpath)]).await
    }

    pub async fn delete(&mut self, xpath: Option<&str>) -> Result<(), Error> {
        self.config_action(ConfigAction::Delete, &[("xpath", xpath)]).await
    }

    /// Merge `element` into the node at `xpath`.
    pub async fn set(&mut self, xpath: Option<&str>, element: Option<&str>) -> Result<(), Error> {
        self.config_action(ConfigAction::Set, &[("xpath", xpath), ("element", element)])
            .await
    }

    /// Replace the node at `xpath` with `element`.
    pub async fn edit(&mut self, xpath: Option<&str>, element: Option<&str>) -> Result<(), Error> {
        self.config_action(ConfigAction::Edit, &[("xpath", xpath), ("element", element)])
            .await
    }

    /// Reorder a rule: `where` is `top`, `bottom`, `before` or `after`
    /// (the last two relative to `dst`).
    pub async fn move_node(
        &mut self,
        xpath: Option<&str>,
        r#where: Option<&str>,
        dst: Option<&str>,
    ) -> Result<(), Error> {
        self.config_action(
            ConfigAction::Move,
            &[("xpath", xpath), ("where", r#where), ("dst", dst)],
        )
        .await
    }

    pub async fn rename(&mut self, xpath: Option<&str>, newname: Option<&str>) -> Result<(), Error> {
        self.config_action(ConfigAction::Rename, &[("xpath", xpath), ("newname", newname)])
            .await
    }

    /// Copy the node at `from` under `xpath` as `newname`.
    pub async fn clone_node(
        &mut self,
        xpath: Option<&str>,
        from: Option<&str>,
        newname: Option<&str>,
    ) -> Result<(), Error> {
        self.config_action(
            ConfigAction::Clone,
            &[("xpath", xpath), ("from", from), ("newname", newname)],
        )
        .await
    }

    /// Override a template value on a Panorama-managed device.
    pub async fn override_node(
        &mut self,
        xpath: Option<&str>,
        element: Option<&str>,
    ) -> Result<(), Error> {
        self.config_action(ConfigAction::Override, &[("xpath", xpath), ("element", element)])
            .await
    }

    /// Apply a `<multi-configure-request>` document.
    ///
    /// With `strict`, the batch is applied transactionally: one failing
    /// action rolls back the rest. Per-action outcomes are summarised in
    /// the response's status detail, one line each.
    pub async fn multi_config(&mut self, element: &str, strict: bool) -> Result<(), Error> {
        let mut request = self.authed_request("multi-config").await?;
        request.push("element", element);
        if strict {
            request.push("strict-transactional", "yes");
        }
        debug!(strict, "multi-config request");
        self.execute(&request).await
    }

    async fn config_action(
        &mut self,
        action: ConfigAction,
        params: &[(&str, Option<&str>)],
    ) -> Result<(), Error> {
        let mut request = self.authed_request("config").await?;
        request.push("action", action.as_str());
        for (name, value) in params {
            request.push_opt(name, *value);
        }
        debug!(%action, xpath = request.param("xpath"), "config request");
        self.execute(&request).await
    }
}
