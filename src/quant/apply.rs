//! Tree-wide application of quantization config.
//!
//! `apply_quantization_config` is the structural half of the lifecycle: it
//! decides which modules carry state. The calibration/freeze broadcasts flip
//! flags on whatever state is already attached.

use regex::Regex;

use crate::error::{CompressionError, Result};
use crate::model::Model;

use super::config::QuantizationConfig;
use super::observer::ModuleQuantizationState;
use super::scheme::QuantizationScheme;

/// A compiled target or ignore pattern.
///
/// Plain patterns match a qualified module name or class tag exactly; the
/// `re:` prefix switches to regular-expression matching against both.
enum TargetMatcher {
    Exact(String),
    Pattern(Regex),
}

impl TargetMatcher {
    fn parse(pattern: &str) -> Result<Self> {
        match pattern.strip_prefix("re:") {
            Some(expr) => {
                let regex = Regex::new(expr).map_err(|e| CompressionError::InvalidTargetPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })?;
                Ok(TargetMatcher::Pattern(regex))
            }
            None => Ok(TargetMatcher::Exact(pattern.to_string())),
        }
    }

    fn matches(&self, qualified_name: &str, kind: &str) -> bool {
        match self {
            TargetMatcher::Exact(target) => target == qualified_name || target == kind,
            TargetMatcher::Pattern(regex) => regex.is_match(qualified_name) || regex.is_match(kind),
        }
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<TargetMatcher>> {
    patterns.iter().map(|p| TargetMatcher::parse(p)).collect()
}

/// Attach quantization state to every module matched by the config.
///
/// Matching is first-match-wins in config-group declaration order, against
/// the module's qualified name and class tag. Ignored modules never receive
/// a scheme, even when they match a target. Re-invocation is idempotent:
/// modules already holding an identical scheme keep their state (and observer
/// statistics) untouched.
///
/// Returns the number of quantized modules after application. Zero matches is
/// not an error; the caller decides whether that means an intentional no-op
/// or a misconfiguration.
///
/// # Errors
///
/// `InvalidTargetPattern` if any target or ignore pattern fails to compile;
/// all patterns are compiled before any module is touched.
pub fn apply_quantization_config(model: &mut Model, config: &QuantizationConfig) -> Result<usize> {
    let mut groups: Vec<(Vec<TargetMatcher>, &QuantizationScheme)> =
        Vec::with_capacity(config.config_groups.len());
    for group in &config.config_groups {
        groups.push((compile_patterns(&group.scheme.targets)?, &group.scheme));
    }
    let ignore = compile_patterns(&config.ignore)?;

    let mut quantized = 0usize;
    model.for_each_module_mut(|name, module| {
        if ignore.iter().any(|m| m.matches(name, module.kind())) {
            return;
        }
        let matched = groups
            .iter()
            .find(|(matchers, _)| matchers.iter().any(|m| m.matches(name, module.kind())));
        let Some((_, scheme)) = matched else {
            return;
        };
        let unchanged =
            matches!(module.quantization(), Some(existing) if existing.scheme == **scheme);
        if !unchanged {
            module.set_quantization(ModuleQuantizationState::new((*scheme).clone()));
        }
        quantized += 1;
    });

    Ok(quantized)
}

/// Resume observer updates on every quantized module.
pub fn set_module_for_calibration(model: &mut Model) {
    model.for_each_module_mut(|_, module| {
        if let Some(state) = module.quantization_mut() {
            state.calibrating = true;
            state.frozen = false;
        }
    });
}

/// Freeze observer updates on every quantized module.
///
/// Quantized forward emulation continues; statistics stop updating until a
/// calibration broadcast re-enables them.
pub fn freeze_module_quantization(model: &mut Model) {
    model.for_each_module_mut(|_, module| {
        if let Some(state) = module.quantization_mut() {
            state.frozen = true;
            state.calibrating = false;
        }
    });
}
