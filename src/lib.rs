//! # CP-Engine: Conditional Preference Reasoning
//!
//! A reasoning engine for conditional preference (CP) theories: rule sets
//! of the form `IF condition THEN best BETTER worst [indifferent]` over
//! interval-valued attribute conditions (spec §3).
//!
//! ## Pipeline
//!
//! ```text
//! rule text
//!     ↓
//! [parser]            → AstTheory
//!     ↓
//! [rule::Rule::from_ast]  → Rule (condition/preference as Intervals)
//!     ↓
//! [theory::Theory]    → consistency checks, split_rules, materialize
//!     ↓
//! [evaluators::*]     → best / topk over a RecordBatch
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cp_engine::{parser, theory::Theory, records::Record};
//!
//! let ast = parser::parse_theory("A=1 BETTER A=2")?;
//! let theory = Theory::from_ast(&ast)?;
//! theory.require_consistent()?;
//!
//! let records: Vec<Record> = /* from an external record loader */;
//! let best = cp_engine::formulas_best(&theory, &records)?;
//! ```
//!
//! ## Consistency
//!
//! Evaluators never silently rank an inconsistent theory. When
//! [`config::EvaluationConfig::strict_consistency`] is set (the default),
//! every top-level evaluator function calls [`theory::Theory::require_consistent`]
//! first and returns [`error::CpError::InconsistentTheory`] on failure.

pub mod ast;
pub mod config;
pub mod error;
pub mod evaluators;
pub mod formula;
pub mod graph;
pub mod interval;
pub mod parser;
pub mod records;
pub mod rule;
pub mod theory;
pub mod value;

use error::CpResult;
use records::Record;
use theory::Theory;

/// Install a `tracing` subscriber reading `RUST_LOG` (or `info` if unset),
/// matching the logging idiom used across this codebase's other binaries.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

macro_rules! evaluator_pair {
    ($best_name:ident, $topk_name:ident, $module:path) => {
        /// See [`evaluators`] module docs for this strategy's semantics.
        pub fn $best_name(theory: &Theory, records: &[Record]) -> CpResult<Vec<Record>> {
            theory.require_consistent()?;
            Ok($module::best(theory, records))
        }

        /// See [`evaluators`] module docs for this strategy's semantics.
        pub fn $topk_name(theory: &Theory, records: &[Record], k: usize) -> CpResult<Vec<Record>> {
            theory.require_consistent()?;
            Ok($module::topk(theory, records, k))
        }
    };
}

evaluator_pair!(classical_best, classical_topk, evaluators::classical);
evaluator_pair!(partition_best, partition_topk, evaluators::partition);
evaluator_pair!(extended_partition_best, extended_partition_topk, evaluators::extended_partition);
evaluator_pair!(formulas_best, formulas_topk, evaluators::formulas_btg);
evaluator_pair!(maxpref_best, maxpref_topk, evaluators::maxpref);

/// Dispatch to whichever strategy `config::Strategy` selects.
pub fn best_with_strategy(
    theory: &Theory,
    records: &[Record],
    strategy: config::Strategy,
) -> CpResult<Vec<Record>> {
    match strategy {
        config::Strategy::Classical => classical_best(theory, records),
        config::Strategy::Partition => partition_best(theory, records),
        config::Strategy::ExtendedPartition => extended_partition_best(theory, records),
        config::Strategy::FormulasBtg => formulas_best(theory, records),
        config::Strategy::MaxPref => maxpref_best(theory, records),
    }
}

/// Dispatch to whichever strategy `config::Strategy` selects.
pub fn topk_with_strategy(
    theory: &Theory,
    records: &[Record],
    k: usize,
    strategy: config::Strategy,
) -> CpResult<Vec<Record>> {
    match strategy {
        config::Strategy::Classical => classical_topk(theory, records, k),
        config::Strategy::Partition => partition_topk(theory, records, k),
        config::Strategy::ExtendedPartition => extended_partition_topk(theory, records, k),
        config::Strategy::FormulasBtg => formulas_topk(theory, records, k),
        config::Strategy::MaxPref => maxpref_topk(theory, records, k),
    }
}
