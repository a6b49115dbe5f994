use futures::future::try_join_all;
use impact_model::{
    Activities, Activity, Countries, Country, Currencies, Currency, Industries,
    Region, Regions,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::ApiClient;
use crate::error::{ImpactError, Result};

const ROOT: &str = "reference";

/// Countries, currencies and industries fetched together.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReferenceSnapshot {
    pub countries: Countries,
    pub currencies: Currencies,
    pub industries: Industries,
}

/// Read-only reference data under `{base}/reference`.
#[derive(Debug, Clone)]
pub struct ReferenceApi {
    client: ApiClient,
}

impl ReferenceApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        field: &str,
    ) -> Result<Vec<T>> {
        let raw: Value = self.client.get_json(segments).await?;
        list_or_field(raw, field).map_err(|reason| {
            ImpactError::UnexpectedResponse {
                url: self
                    .client
                    .endpoint(segments)
                    .unwrap_or_else(|_| self.client.base_url().clone()),
                reason,
            }
        })
    }

    pub async fn activities(&self, industry: &str) -> Result<Activities> {
        let activities: Vec<Activity> = self
            .fetch_list(&[ROOT, "activities", "industry", industry], "activities")
            .await?;
        debug!(%industry, count = activities.len(), "fetched activities");
        Ok(Activities { activities })
    }

    /// Activities for several industries, fetched concurrently; results
    /// keep the order of `industries`.
    pub async fn activities_for(
        &self,
        industries: &[String],
    ) -> Result<Vec<(String, Activities)>> {
        let fetched =
            try_join_all(industries.iter().map(|name| self.activities(name)))
                .await?;
        Ok(industries.iter().cloned().zip(fetched).collect())
    }

    pub async fn countries(&self) -> Result<Countries> {
        let countries: Vec<Country> =
            self.fetch_list(&[ROOT, "countries"], "countries").await?;
        Ok(Countries { countries })
    }

    pub async fn currencies(&self) -> Result<Currencies> {
        let currencies: Vec<Currency> =
            self.fetch_list(&[ROOT, "currencies"], "currencies").await?;
        Ok(Currencies { currencies })
    }

    pub async fn industries(&self) -> Result<Industries> {
        let industries: Vec<String> =
            self.fetch_list(&[ROOT, "industries"], "industries").await?;
        Ok(Industries { industries })
    }

    pub async fn regions(&self) -> Result<Regions> {
        let regions: Vec<Region> =
            self.fetch_list(&[ROOT, "regions"], "regions").await?;
        Ok(Regions { regions })
    }

    /// The three independent lookups issued concurrently.
    pub async fn snapshot(&self) -> Result<ReferenceSnapshot> {
        let (countries, currencies, industries) = tokio::try_join!(
            self.countries(),
            self.currencies(),
            self.industries()
        )?;
        Ok(ReferenceSnapshot {
            countries,
            currencies,
            industries,
        })
    }
}

/// The service answers either with a bare array or with an object holding
/// the array under `field`.
fn list_or_field<T: DeserializeOwned>(
    raw: Value,
    field: &str,
) -> std::result::Result<Vec<T>, String> {
    let list = match raw {
        Value::Array(_) => raw,
        Value::Object(mut map) => {
            map.remove(field).unwrap_or(Value::Array(Vec::new()))
        }
        other => return Err(format!("expected a list of {field}, got {other}")),
    };
    serde_json::from_value(list).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_bare_and_wrapped_lists() {
        let bare: Vec<Country> =
            list_or_field(json!([{"code": "GB", "name": "United Kingdom"}]), "countries")
                .unwrap();
        let wrapped: Vec<Country> = list_or_field(
            json!({"countries": [{"code": "GB", "name": "United Kingdom"}]}),
            "countries",
        )
        .unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare[0].code, "GB");
    }

    #[test]
    fn scalar_reply_is_rejected() {
        assert!(list_or_field::<Country>(json!("nope"), "countries").is_err());
    }
}
