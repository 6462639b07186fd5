//! Search strategies and configuration.
//!
//! Each strategy axis is a closed enum picked once when the engine is built:
//! generation ∈ {sample, propose}, evaluation ∈ {value, vote}, selection ∈ {sample, greedy}.

use serde::{Deserialize, Serialize};

macro_rules! strategy_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(
                        "unknown {}: {} (use {})",
                        stringify!($name),
                        s,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

strategy_enum!(
    /// How candidate children are produced from a frontier state.
    GenerateMethod {
        Sample => "sample",
        Propose => "propose",
    }
);

strategy_enum!(
    /// How candidates are scored.
    EvaluateMethod {
        Value => "value",
        Vote => "vote",
    }
);

strategy_enum!(
    /// How the next frontier is drawn from the scored candidates.
    #[derive(Default)]
    SelectMethod {
        Sample => "sample",
        #[default]
        Greedy => "greedy",
    }
);

strategy_enum!(
    /// Prompt flavour for sample-style generation and naive runs.
    #[derive(Default)]
    PromptStyle {
        #[default]
        Standard => "standard",
        Cot => "cot",
    }
);

strategy_enum!(
    /// Which statistic of a step's scores is compared against the reflection threshold.
    #[derive(Default)]
    TriggerPolicy {
        #[default]
        Max => "max",
        Mean => "mean",
    }
);

impl TriggerPolicy {
    /// Statistic of `values`; None for an empty step.
    pub fn statistic(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(match self {
            Self::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Mean => values.iter().sum::<f64>() / values.len() as f64,
        })
    }
}

/// Which reflection scopes are active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionSettings {
    pub local: bool,
    pub global: bool,
}

impl ReflectionSettings {
    pub fn any(&self) -> bool {
        self.local || self.global
    }

    /// `local-global`, `local`, `global` or empty; used in log file names.
    pub fn suffix(&self) -> String {
        let mut parts = Vec::new();
        if self.local {
            parts.push("local");
        }
        if self.global {
            parts.push("global");
        }
        parts.join("-")
    }
}

/// Search parameters fixed for a whole run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    pub method_generate: GenerateMethod,
    pub method_evaluate: EvaluateMethod,
    pub method_select: SelectMethod,
    pub prompt_style: PromptStyle,
    pub n_generate_sample: usize,
    pub n_evaluate_sample: usize,
    pub n_select_sample: usize,
    /// Scores below this trigger a reflection.
    pub threshold: f64,
    pub trigger: TriggerPolicy,
    pub max_reflections_per_step: usize,
    /// Seed for the sampling selector; None draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            method_generate: GenerateMethod::Propose,
            method_evaluate: EvaluateMethod::Value,
            method_select: SelectMethod::Greedy,
            prompt_style: PromptStyle::Standard,
            n_generate_sample: 1,
            n_evaluate_sample: 1,
            n_select_sample: 1,
            threshold: 0.5,
            trigger: TriggerPolicy::Max,
            max_reflections_per_step: 3,
            seed: None,
        }
    }
}

impl SearchConfig {
    pub fn new(method_generate: GenerateMethod, method_evaluate: EvaluateMethod) -> Self {
        Self {
            method_generate,
            method_evaluate,
            ..Self::default()
        }
    }

    pub fn with_select(mut self, method: SelectMethod) -> Self {
        self.method_select = method;
        self
    }

    pub fn with_prompt_style(mut self, style: PromptStyle) -> Self {
        self.prompt_style = style;
        self
    }

    pub fn with_samples(mut self, generate: usize, evaluate: usize, select: usize) -> Self {
        self.n_generate_sample = generate;
        self.n_evaluate_sample = evaluate;
        self.n_select_sample = select;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_trigger(mut self, trigger: TriggerPolicy) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_max_reflections_per_step(mut self, n: usize) -> Self {
        self.max_reflections_per_step = n;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: every strategy parses case-insensitively and round-trips through Display.
    #[test]
    fn strategies_parse_and_display() {
        assert_eq!("Sample".parse::<GenerateMethod>().unwrap(), GenerateMethod::Sample);
        assert_eq!("propose".parse::<GenerateMethod>().unwrap(), GenerateMethod::Propose);
        assert_eq!("VOTE".parse::<EvaluateMethod>().unwrap(), EvaluateMethod::Vote);
        assert_eq!("greedy".parse::<SelectMethod>().unwrap(), SelectMethod::Greedy);
        assert_eq!("cot".parse::<PromptStyle>().unwrap(), PromptStyle::Cot);
        assert_eq!("mean".parse::<TriggerPolicy>().unwrap(), TriggerPolicy::Mean);
        assert_eq!(EvaluateMethod::Value.to_string(), "value");
    }

    #[test]
    fn strategy_rejects_unknown_value() {
        let err = "beam".parse::<SelectMethod>().unwrap_err();
        assert!(err.contains("unknown SelectMethod"), "{}", err);
        assert!(err.contains("sample, greedy"), "{}", err);
    }

    /// **Scenario**: strategies serialize as lowercase strings.
    #[test]
    fn strategies_serialize_lowercase() {
        let v = serde_json::to_value(GenerateMethod::Propose).unwrap();
        assert_eq!(v, serde_json::json!("propose"));
    }

    #[test]
    fn strategy_defaults() {
        assert_eq!(SelectMethod::default(), SelectMethod::Greedy);
        assert_eq!(PromptStyle::default(), PromptStyle::Standard);
        assert_eq!(TriggerPolicy::default(), TriggerPolicy::Max);
        let c = SearchConfig::default();
        assert_eq!(c.method_select, SelectMethod::default());
        assert_eq!(c.trigger, TriggerPolicy::default());
    }

    #[test]
    fn trigger_statistics() {
        assert_eq!(TriggerPolicy::Max.statistic(&[0.1, 3.0, 1.0]), Some(3.0));
        assert_eq!(TriggerPolicy::Mean.statistic(&[1.0, 3.0]), Some(2.0));
        assert_eq!(TriggerPolicy::Max.statistic(&[]), None);
    }

    #[test]
    fn reflection_suffix() {
        let both = ReflectionSettings {
            local: true,
            global: true,
        };
        assert_eq!(both.suffix(), "local-global");
        assert_eq!(ReflectionSettings::default().suffix(), "");
        assert!(!ReflectionSettings::default().any());
    }

    #[test]
    fn config_builders_override_defaults() {
        let c = SearchConfig::new(GenerateMethod::Sample, EvaluateMethod::Vote)
            .with_samples(5, 3, 2)
            .with_threshold(1.5)
            .with_seed(Some(7));
        assert_eq!(c.method_select, SelectMethod::Greedy);
        assert_eq!((c.n_generate_sample, c.n_evaluate_sample, c.n_select_sample), (5, 3, 2));
        assert_eq!(c.threshold, 1.5);
        assert_eq!(c.seed, Some(7));
    }
}
