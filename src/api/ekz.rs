//! [myEKZ](https://my.ekz.ch/verbrauch/) customer portal client.

use std::{cell::Cell, time::Duration};

use serde::{Deserialize, de::DeserializeOwned};
use ureq::Agent;

use crate::{
    api::{
        Portal,
        portal::{ConsumptionData, InstallationData, InstallationProperty, InstallationSelection},
    },
    core::{DayRange, civil_time::format_api_day},
    error::ExportError,
    prelude::*,
};

const BASE_URL: &str = "https://my.ekz.ch";
const API_URL: &str = "https://my.ekz.ch/api/portal-services";
const USER_AGENT: &str = "ekzexport";
const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml";
const JSON_ACCEPT: &str = "application/json, text/plain, */*";

/// Session with the portal, logging in lazily on the first API call.
pub struct Api {
    client: Agent,
    username: String,
    password: String,
    is_logged_in: Cell<bool>,
}

impl Api {
    pub fn new(username: String, password: String) -> Self {
        let client =
            Agent::config_builder().timeout_global(Some(Duration::from_secs(30))).build().into();
        Self { client, username, password, is_logged_in: Cell::new(false) }
    }

    #[instrument(skip_all, fields(username = %self.username))]
    fn ensure_logged_in(&self) -> Result {
        if self.is_logged_in.get() {
            return Ok(());
        }
        info!("logging in…");
        let page = self
            .client
            .get(format!("{BASE_URL}/verbrauch/"))
            .header("User-Agent", USER_AGENT)
            .header("Accept", HTML_ACCEPT)
            .call()
            .context("failed to open the login page")?
            .body_mut()
            .read_to_string()?;
        let Some(action) = find_login_action(&page) else {
            if is_maintenance_page(&page) {
                return Err(ExportError::Maintenance.into());
            }
            bail!("login form not found on the page");
        };
        self.client
            .post(action.as_str())
            .header("User-Agent", USER_AGENT)
            .header("Accept", HTML_ACCEPT)
            .send_form([("username", self.username.as_str()), ("password", self.password.as_str())])
            .context("failed to submit the credentials")?;
        self.is_logged_in.set(true);
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        self.ensure_logged_in()?;
        let mut request = self
            .client
            .get(format!("{API_URL}{path}"))
            .header("User-Agent", USER_AGENT)
            .header("Accept", JSON_ACCEPT);
        for &(key, value) in query {
            request = request.query(key, value);
        }
        request
            .call()
            .with_context(|| format!("failed to call `{path}`"))?
            .body_mut()
            .read_json()
            .with_context(|| format!("failed to deserialize the response from `{path}`"))
    }

    fn csrf_token(&self) -> Result<String> {
        #[derive(Deserialize)]
        struct Token {
            token: String,
        }
        Ok(self.get_json::<Token>("/csrf/v1/token", &[])?.token)
    }

    /// End the session, if there is one.
    #[instrument(skip_all)]
    pub fn logout(&self) -> Result {
        if !self.is_logged_in.get() {
            return Ok(());
        }
        let token = self.csrf_token()?;
        self.client
            .post(format!("{BASE_URL}/logout"))
            .header("User-Agent", USER_AGENT)
            .header("Accept", HTML_ACCEPT)
            .send_form([("_csrf", token.as_str())])
            .context("failed to log out")?;
        self.is_logged_in.set(false);
        debug!("logged out");
        Ok(())
    }
}

impl Portal for Api {
    #[instrument(skip_all)]
    fn installation_selection(&self) -> Result<InstallationSelection> {
        self.get_json(
            "/consumption-view/v1/installation-selection-data",
            &[("installationVariant", "CONSUMPTION")],
        )
    }

    #[instrument(skip_all, fields(installation_id = installation_id))]
    fn installation_properties(&self, installation_id: &str) -> Result<Vec<InstallationProperty>> {
        let data: InstallationData = self.get_json(
            "/consumption-view/v1/installation-data",
            &[("installationId", installation_id)],
        )?;
        info!(n_properties = data.status.len(), "fetched");
        Ok(data.status)
    }

    #[instrument(
        skip_all,
        fields(installation_id = installation_id, data_type = data_type, range = %range),
    )]
    fn consumption(
        &self,
        installation_id: &str,
        data_type: &str,
        range: DayRange,
    ) -> Result<ConsumptionData> {
        let from = format_api_day(range.start);
        let to = format_api_day(range.end);
        self.get_json(
            "/consumption-view/v1/consumption-data",
            &[
                ("installationId", installation_id),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("type", data_type),
            ],
        )
    }
}

/// Extract the target of the `kc-form-login` form.
fn find_login_action(page: &str) -> Option<String> {
    let form_id = page.find(r#"id="kc-form-login""#)?;
    let tag_start = page[..form_id].rfind("<form")?;
    let tag_end = form_id + page[form_id..].find('>')?;
    let tag = &page[tag_start..tag_end];
    let action_start = tag.find(r#"action=""#)? + r#"action=""#.len();
    let action_end = action_start + tag[action_start..].find('"')?;
    Some(tag[action_start..action_end].replace("&amp;", "&"))
}

fn is_maintenance_page(page: &str) -> bool {
    page.contains("Es tut uns leid") || page.contains("Systemunterbruch")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_login_action_ok() {
        // language=HTML
        let page = r#"
            <html><body>
            <form id="search" action="/search"></form>
            <form id="kc-form-login" onsubmit="login.disabled = true; return true;" action="https://login.ekz.ch/auth/realms/myEKZ/login-actions/authenticate?session_code=abc&amp;execution=def&amp;client_id=portal" method="post">
                <input name="username">
            </form>
            </body></html>
        "#;
        assert_eq!(
            find_login_action(page).as_deref(),
            Some(
                "https://login.ekz.ch/auth/realms/myEKZ/login-actions/authenticate?session_code=abc&execution=def&client_id=portal"
            )
        );
    }

    #[test]
    fn find_login_action_missing() {
        let page = "<html><body><h1>Es tut uns leid</h1></body></html>";
        assert_eq!(find_login_action(page), None);
        assert!(is_maintenance_page(page));
    }

    #[test]
    #[ignore = "logs in to the portal"]
    fn installation_selection_ok() -> Result {
        let api = Api::new(std::env::var("EKZ_USERNAME")?, std::env::var("EKZ_PASSWORD")?);
        let selection = api.installation_selection()?;
        assert!(!selection.contracts.is_empty());
        api.logout()
    }
}
