//! Batch lowering over the whole fixture set

mod common;

use common::*;
use tacgraph_ir::api::lower_batch_with_config;
use tacgraph_ir::config::PipelineConfig;
use tacgraph_ir::{lower_batch, LanguageId};

fn units() -> Vec<(LanguageId, String)> {
    all_programs()
        .map(|p| (p.language, p.source.to_string()))
        .collect()
}

#[test]
fn test_batch_preserves_order_and_matches_sequential() {
    let units = units();
    let results = lower_batch(&units);
    assert_eq!(results.len(), units.len());
    for (program, result) in all_programs().zip(&results) {
        let ir = result
            .as_ref()
            .unwrap_or_else(|e| panic!("{} {}: {}", program.language.name(), program.name, e));
        assert_eq!(ir, &lower_program(program), "{} {}", program.language.name(), program.name);
    }
}

#[test]
fn test_batch_result_independent_of_thread_count() {
    let units = units();
    let mut one = PipelineConfig::default();
    one.batch.threads = Some(1);
    let mut four = PipelineConfig::default();
    four.batch.threads = Some(4);

    let a: Vec<_> = lower_batch_with_config(&units, &one)
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    let b: Vec<_> = lower_batch_with_config(&units, &four)
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(a, b);
}
