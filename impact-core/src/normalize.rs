//! Breakdown and holdings normalization.
//!
//! Both collections end up with weights summing to 1.0 within the
//! configured tolerance. Sums outside the tolerance are rescaled rather
//! than rejected; only an all-zero collection is unrecoverable.

use std::collections::HashSet;

use impact_config::NormalizationConfig;
use impact_model::{
    Activity, BreakdownItem, HoldingItem, UnknownActivityPolicy,
};
use tracing::{info, warn};

use crate::error::ValidationError;

/// One breakdown row whose activity id was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityRewrite {
    /// Position in the breakdown.
    pub index: usize,
    pub from: u32,
    pub to: u32,
}

/// What the normalizer changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizationReport {
    /// Rows synthesized from suggestions for an empty breakdown.
    pub synthesized: usize,
    /// Rows whose unknown activity id was replaced.
    pub rewritten: Vec<ActivityRewrite>,
    /// The original sum, when the weights were rescaled.
    pub rescaled_from: Option<f64>,
}

impl NormalizationReport {
    /// `true` when the input was returned unchanged.
    pub fn is_untouched(&self) -> bool {
        self.synthesized == 0
            && self.rewritten.is_empty()
            && self.rescaled_from.is_none()
    }
}

trait Weighted {
    fn weight(&self) -> f64;
    fn set_weight(&mut self, weight: f64);
}

impl Weighted for BreakdownItem {
    fn weight(&self) -> f64 {
        self.weight
    }
    fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }
}

impl Weighted for HoldingItem {
    fn weight(&self) -> f64 {
        self.weight
    }
    fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }
}

/// Brings breakdowns and holdings into the shape the service accepts:
/// known activities, valid rows and weights summing to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    config: NormalizationConfig,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizationConfig::default())
    }
}

impl Normalizer {
    /// Normalizer applying `config`.
    pub fn new(config: NormalizationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizationConfig {
        &self.config
    }

    /// Normalize an asset breakdown against the activities suggested at
    /// creation time.
    ///
    /// * empty + suggestions: up to `max_default_activities` rows at equal
    ///   weight in `home_country`;
    /// * non-empty + suggestions: unknown activity ids go through the
    ///   [`UnknownActivityPolicy`];
    /// * empty + no suggestions: returned empty with a warning.
    pub fn normalize_breakdown(
        &self,
        mut items: Vec<BreakdownItem>,
        suggestions: &[Activity],
        home_country: &str,
    ) -> Result<(Vec<BreakdownItem>, NormalizationReport), ValidationError> {
        let mut report = NormalizationReport::default();

        if items.is_empty() {
            if suggestions.is_empty() {
                warn!("no breakdown items provided or generated");
                return Ok((items, report));
            }
            let n = self.config.max_default_activities.min(suggestions.len());
            let weight = 1.0 / n as f64;
            items = suggestions[..n]
                .iter()
                .map(|activity| BreakdownItem::new(activity.id, home_country, weight))
                .collect();
            report.synthesized = n;
            info!(rows = n, country = %home_country, "synthesized default breakdown");
        } else if suggestions.is_empty() {
            warn!(
                rows = items.len(),
                "no suggested activities to validate against; keeping provided breakdown"
            );
        } else {
            report.rewritten = self.apply_activity_policy(&mut items, suggestions)?;
        }

        check_breakdown(&items)?;
        report.rescaled_from =
            rescale(&mut items, self.config.tolerance, "breakdown")?;
        Ok((items, report))
    }

    /// Normalize group holdings. An empty collection is an error.
    pub fn normalize_holdings(
        &self,
        mut items: Vec<HoldingItem>,
    ) -> Result<(Vec<HoldingItem>, NormalizationReport), ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::EmptyHoldings);
        }
        check_holdings(&items)?;
        let rescaled_from =
            rescale(&mut items, self.config.tolerance, "holdings")?;
        Ok((
            items,
            NormalizationReport {
                rescaled_from,
                ..NormalizationReport::default()
            },
        ))
    }

    fn apply_activity_policy(
        &self,
        items: &mut [BreakdownItem],
        suggestions: &[Activity],
    ) -> Result<Vec<ActivityRewrite>, ValidationError> {
        let known: HashSet<u32> = suggestions.iter().map(|a| a.id).collect();
        let first = suggestions[0].id;

        match self.config.unknown_activity {
            UnknownActivityPolicy::RewriteToFirstSuggestion => {
                let mut rewrites = Vec::new();
                for (index, item) in items.iter_mut().enumerate() {
                    if known.contains(&item.activity_id) {
                        continue;
                    }
                    warn!(
                        index,
                        activity_id = item.activity_id,
                        replacement = first,
                        "activity id not suggested; using first suggestion"
                    );
                    rewrites.push(ActivityRewrite {
                        index,
                        from: item.activity_id,
                        to: first,
                    });
                    item.activity_id = first;
                }
                Ok(rewrites)
            }
            UnknownActivityPolicy::Reject => {
                let unknown: Vec<String> = items
                    .iter()
                    .enumerate()
                    .filter(|(_, item)| !known.contains(&item.activity_id))
                    .map(|(index, item)| {
                        format!("breakdown[{index}].activityId={}", item.activity_id)
                    })
                    .collect();
                if unknown.is_empty() {
                    Ok(Vec::new())
                } else {
                    Err(ValidationError::UnknownActivities(unknown))
                }
            }
        }
    }
}

fn valid_weight(weight: f64) -> bool {
    weight.is_finite() && weight >= 0.0
}

fn check_breakdown(items: &[BreakdownItem]) -> Result<(), ValidationError> {
    let mut invalid = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let code = item.country_code.as_str();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            invalid.push(format!("breakdown[{index}].countryCode"));
        }
        if !valid_weight(item.weight) {
            invalid.push(format!("breakdown[{index}].weight"));
        }
    }
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::InvalidItems(invalid))
    }
}

fn check_holdings(items: &[HoldingItem]) -> Result<(), ValidationError> {
    let mut invalid = Vec::new();
    for (index, item) in items.iter().enumerate() {
        if item.id.trim().is_empty() {
            invalid.push(format!("holdings[{index}].id"));
        }
        if !valid_weight(item.weight) {
            invalid.push(format!("holdings[{index}].weight"));
        }
    }
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::InvalidItems(invalid))
    }
}

/// Divide every weight by the sum when it is off by more than `tolerance`.
/// Returns the original sum when rescaling happened.
fn rescale<T: Weighted>(
    items: &mut [T],
    tolerance: f64,
    collection: &'static str,
) -> Result<Option<f64>, ValidationError> {
    if items.is_empty() {
        return Ok(None);
    }
    let sum: f64 = items.iter().map(Weighted::weight).sum();
    if (sum - 1.0).abs() <= tolerance {
        return Ok(None);
    }
    if sum <= 0.0 {
        return Err(ValidationError::ZeroWeightSum { collection });
    }
    warn!(collection, sum, "weights do not sum to 1.0; rescaling");
    for item in items.iter_mut() {
        item.set_weight(item.weight() / sum);
    }
    Ok(Some(sum))
}
