//! Stage `battery`: somete hipótesis al referee de permutaciones.
//!
//! Config aceptada (todas opcionales):
//! - `hypotheses`: `[{ "id", "cause_key", "effect_key" }, ..]`. Ausente o
//!   vacía → se valida la relación primaria del bundle.
//! - `num_shuffles`, `significance`, `early_stop`, `test`: sobreescriben la
//!   configuración por defecto del referee.

use log::{info, warn};
use std::sync::Arc;

use hypo_core::model::{Artifact, ArtifactPayload, HypothesisPayload, VerdictStatus};
use hypo_core::stage::StageMetrics;
use hypo_core::{RngPort, StageContext, StageError, StageOutput};

use crate::referee::{HypothesisSpec, PermutationReferee, RefereeConfig, RefereeContext};
use crate::stages::{configured_test, ensure_bundle};

pub struct BatteryStage {
    rng: Arc<dyn RngPort>,
    defaults: RefereeConfig,
}

impl std::fmt::Debug for BatteryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatteryStage").field("defaults", &self.defaults).finish()
    }
}

impl BatteryStage {
    pub fn new(rng: Arc<dyn RngPort>, defaults: RefereeConfig) -> Self {
        Self { rng, defaults }
    }

    fn referee_for(&self, ctx: &StageContext<'_>) -> Result<PermutationReferee, StageError> {
        let mut config = self.defaults.clone();
        if let Some(n) = ctx.spec.config_u64("num_shuffles") {
            config.set_num_shuffles(usize::try_from(n).unwrap_or(usize::MAX));
        }
        if let Some(alpha) = ctx.spec.config_f64("significance") {
            if !(alpha > 0.0 && alpha < 1.0) {
                return Err(StageError::InvalidConfig(format!("significance out of range: {alpha}")));
            }
            config = config.with_significance(alpha);
        }
        if let Some(early_stop) = ctx.spec.config_bool("early_stop") {
            config = config.with_early_stop(early_stop);
        }
        if ctx.spec.config_str("test").is_some() {
            config = config.with_test(configured_test(ctx)?);
        }
        Ok(PermutationReferee::with_config(self.rng.clone(), config))
    }

    fn hypotheses(ctx: &StageContext<'_>, referee: &PermutationReferee) -> Result<Vec<HypothesisSpec>, StageError> {
        let configured: Vec<HypothesisSpec> = match ctx.spec.config.get("hypotheses") {
            Some(raw) => serde_json::from_value(raw.clone())
                .map_err(|e| StageError::InvalidConfig(format!("invalid hypotheses: {e}")))?,
            None => Vec::new(),
        };
        if !configured.is_empty() {
            return Ok(configured);
        }
        Ok(referee.find_primary_relationship(ctx.bundle)
                  .map(|p| {
                      let id = format!("primary:{}:{}", p.variable_x, p.variable_y);
                      vec![HypothesisSpec::new(id, p.variable_x, p.variable_y)]
                  })
                  .unwrap_or_default())
    }

    pub fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        ensure_bundle(ctx)?;
        let referee = self.referee_for(ctx)?;
        let hypotheses = Self::hypotheses(ctx, &referee)?;
        if hypotheses.is_empty() {
            warn!("battery:no_hypotheses stage={}", ctx.stage_name());
            return Ok(StageOutput::default().with_warning("no hypotheses to validate"));
        }

        let referee_ctx =
            RefereeContext::new(ctx.run_id.as_str(), ctx.stage_name(), ctx.seed()).with_cancellation(ctx.cancel);

        let mut artifacts = Vec::with_capacity(hypotheses.len());
        let mut results = Vec::with_capacity(hypotheses.len());
        for hypothesis in &hypotheses {
            let validation = referee.validate_hypothesis(&referee_ctx, hypothesis, ctx.bundle)?;
            results.push(validation.clone());
            let payload = HypothesisPayload { hypothesis_id: hypothesis.id.clone(),
                                              cause_key: hypothesis.cause_key.clone(),
                                              effect_key: hypothesis.effect_key.clone(),
                                              validation };
            artifacts.push(Artifact::new(ArtifactPayload::Hypothesis(payload)));
        }

        let count = |status: VerdictStatus| results.iter().filter(|r| r.status == status).count();
        let validated = count(VerdictStatus::Validated);
        let rejected = count(VerdictStatus::Rejected);
        let inadmissible = count(VerdictStatus::Inadmissible);
        info!("battery:done stage={} validated={validated} rejected={rejected} inadmissible={inadmissible}",
              ctx.stage_name());

        let mut metrics = StageMetrics { processed_count: results.len(),
                                         success_count: validated,
                                         failure_count: rejected + inadmissible,
                                         ..StageMetrics::default() };
        if let [only] = results.as_slice() {
            metrics.effect_size = Some(only.effect_size);
            metrics.p_value = Some(only.p_value);
            metrics.passed = Some(only.is_validated());
            metrics.confidence = Some(only.confidence);
        }
        metrics.custom.insert("validated".to_string(), validated.into());
        metrics.custom.insert("rejected".to_string(), rejected.into());
        metrics.custom.insert("inadmissible".to_string(), inadmissible.into());
        metrics.custom.insert("num_shuffles".to_string(), referee.config().num_shuffles().into());

        Ok(StageOutput::new(artifacts, metrics))
    }
}
