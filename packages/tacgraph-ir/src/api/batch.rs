//! Batch lowering
//!
//! Units are independent: each gets its own frontend call (and so its own
//! `LoweringContext`), and a failing or panicking unit only fails its own
//! slot in the result vector. Output order matches input order.

use crate::config::PipelineConfig;
use crate::features::lowering::{DeterministicFrontend, Frontend};
use crate::features::parsing::LanguageId;
use crate::shared::models::{IrInstruction, Result, TacError};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub fn lower_batch(units: &[(LanguageId, String)]) -> Vec<Result<Vec<IrInstruction>>> {
    lower_batch_with_config(units, &PipelineConfig::default())
}

pub fn lower_batch_with_config(
    units: &[(LanguageId, String)],
    config: &PipelineConfig,
) -> Vec<Result<Vec<IrInstruction>>> {
    if let Err(err) = config.validate() {
        let message = err.to_string();
        return units.iter().map(|_| Err(TacError::config(message.clone()))).collect();
    }

    let start = Instant::now();
    let lower_one = |unit: &(LanguageId, String)| lower_unit(unit, config);

    #[cfg(feature = "parallel")]
    let results: Vec<Result<Vec<IrInstruction>>> = {
        let threads = config.batch.effective_threads();
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| units.par_iter().map(lower_one).collect()),
            Err(err) => {
                tracing::warn!("thread pool unavailable ({}); lowering sequentially", err);
                units.iter().map(lower_one).collect()
            }
        }
    };
    #[cfg(not(feature = "parallel"))]
    let results: Vec<Result<Vec<IrInstruction>>> = units.iter().map(lower_one).collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    tracing::info!(
        "lowered {} units ({} failed) in {:.2}ms",
        units.len(),
        failed,
        start.elapsed().as_secs_f64() * 1000.0
    );
    results
}

fn lower_unit(unit: &(LanguageId, String), config: &PipelineConfig) -> Result<Vec<IrInstruction>> {
    let (language, source) = unit;
    let frontend = DeterministicFrontend::with_config(*language, config.lowering.clone());
    catch_unwind(AssertUnwindSafe(|| frontend.lower(None, source.as_bytes()))).unwrap_or_else(
        |payload| {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::warn!("[{}] lowering panicked: {}", language.name(), detail);
            Err(TacError::internal(format!(
                "lowering {} source panicked: {}",
                language.name(),
                detail
            )))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::lower_source;
    use crate::config::Preset;

    fn units() -> Vec<(LanguageId, String)> {
        vec![
            (LanguageId::Python, "x = 1\n".to_string()),
            (LanguageId::JavaScript, "let y = 2;\n".to_string()),
            (LanguageId::Lua, "local z = 3\n".to_string()),
        ]
    }

    #[test]
    fn test_batch_matches_single_unit_lowering() {
        let units = units();
        let results = lower_batch(&units);
        assert_eq!(results.len(), units.len());
        for ((lang, src), result) in units.iter().zip(&results) {
            let expected = lower_source(*lang, src).unwrap();
            assert_eq!(result.as_ref().unwrap(), &expected);
        }
    }

    #[test]
    fn test_single_thread_batch() {
        let mut config = PipelineConfig::preset(Preset::Fast);
        config.batch.threads = Some(1);
        let results = lower_batch_with_config(&units(), &config);
        assert!(results.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn test_invalid_config_fails_every_unit() {
        let mut config = PipelineConfig::default();
        config.batch.threads = Some(0);
        let results = lower_batch_with_config(&units(), &config);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_err()));
    }

    #[test]
    fn test_empty_batch() {
        assert!(lower_batch(&[]).is_empty());
    }
}
