//! Campaign records as returned by the prediction service
//!
//! Field names on the wire follow the predictor's column names
//! (`Platform`, `Budget`, `Predicted_Success`, ...). Columns that are not part
//! of the fixed field set are kept in `extra` and written back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of the ingested dataset, annotated by the predictor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CampaignRecord {
    /// Advertising channel (free-form, case-sensitive)
    #[serde(rename = "Platform", default, deserialize_with = "de::text")]
    pub platform: String,

    /// Campaign budget in currency units
    #[serde(
        rename = "Budget",
        default,
        deserialize_with = "de::opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub budget: Option<f64>,

    /// Campaign duration in days
    #[serde(
        rename = "Duration",
        default,
        deserialize_with = "de::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_days: Option<String>,

    #[serde(
        rename = "Content_Type",
        default,
        deserialize_with = "de::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<String>,

    #[serde(
        rename = "Target_Gender",
        default,
        deserialize_with = "de::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_gender: Option<String>,

    #[serde(
        rename = "Target_Age",
        default,
        deserialize_with = "de::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_age: Option<String>,

    #[serde(
        rename = "Region",
        default,
        deserialize_with = "de::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub region: Option<String>,

    /// Binary classification result; `None` until scored
    #[serde(
        rename = "Predicted_Success",
        default,
        deserialize_with = "de::opt_flag",
        serialize_with = "ser::opt_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub predicted_success: Option<bool>,

    /// Predictor confidence (0-100); `None` until scored
    #[serde(
        rename = "Success_Probability",
        default,
        deserialize_with = "de::opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub success_probability: Option<f64>,

    /// Passthrough columns (Campaign_ID, the predictor's row label, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Investment verdict derived from the prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Invest,
    Avoid,
    Unscored,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Invest => "Invest",
            Verdict::Avoid => "Avoid",
            Verdict::Unscored => "Pending",
        }
    }
}

impl CampaignRecord {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            ..Self::default()
        }
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_prediction(mut self, predicted_success: bool, success_probability: f64) -> Self {
        self.predicted_success = Some(predicted_success);
        self.success_probability = Some(success_probability);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_audience(mut self, target_age: impl Into<String>, region: impl Into<String>) -> Self {
        self.target_age = Some(target_age.into());
        self.region = Some(region.into());
        self
    }

    /// True once the predictor has attached both prediction fields
    pub fn is_scored(&self) -> bool {
        self.predicted_success.is_some() && self.success_probability.is_some()
    }

    pub fn is_predicted_successful(&self) -> bool {
        self.predicted_success == Some(true)
    }

    /// Success probability, 0 when unscored or not a finite number
    pub fn probability(&self) -> f64 {
        self.success_probability
            .filter(|p| p.is_finite())
            .unwrap_or(0.0)
    }

    /// Budget, 0 when absent or not a finite number
    pub fn budget_or_zero(&self) -> f64 {
        self.budget.filter(|b| b.is_finite()).unwrap_or(0.0)
    }

    pub fn verdict(&self) -> Verdict {
        match self.predicted_success {
            Some(true) => Verdict::Invest,
            Some(false) => Verdict::Avoid,
            None => Verdict::Unscored,
        }
    }
}

/// Lenient decoders for predictor output.
///
/// The predictor serialises a pandas frame, so a "text" column may come back
/// as a number and a flag may be `1`, `1.0` or `true`.
mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn value_to_text(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(value_to_text(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(value_to_text(Value::deserialize(deserializer)?))
    }

    pub fn opt_number<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => Ok(n.as_f64()),
            Value::String(s) => Ok(s.trim().parse::<f64>().ok()),
            _ => Ok(None),
        }
    }

    pub fn opt_flag<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<bool>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(b) => Ok(Some(b)),
            Value::Number(n) => Ok(n.as_f64().map(|v| v >= 0.5)),
            Value::String(s) => match s.trim() {
                "1" | "true" | "True" => Ok(Some(true)),
                "0" | "false" | "False" => Ok(Some(false)),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }
}

mod ser {
    use serde::Serializer;

    /// Flags go back out as 0/1, matching the predictor's encoding
    pub fn opt_flag<S: Serializer>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(flag) => serializer.serialize_u8(u8::from(*flag)),
            None => serializer.serialize_none(),
        }
    }
}
