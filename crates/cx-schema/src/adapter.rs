//! Structural adapter
//!
//! Implements [`SchemaCapability`] over a [`Schema`] tree. Deriving an
//! initial state works in three steps:
//!
//! 1. Synthesize a value from the schema (declared defaults or zero values)
//!    and layer caller constraints over it.
//! 2. Parse against a slimmed schema (effects and defaults removed, checks
//!    removed in lax mode).
//! 3. If parsing fails, repair the value issue by issue until it parses.
//!
//! The repaired value is returned as `data`, while `success` and `errors`
//! describe the value before repair.

use std::sync::Arc;

use cx_path::{parse_segments, resolve_mut, set_at, PathSegment};
use serde_json::{Map, Value};

use crate::capability::{
    InitialState, InitialStateOptions, SchemaCapability, ValidationMode, ValidationOutcome,
};
use crate::error::{SchemaError, SchemaResult, ValidationError};
use crate::issue::{Issue, IssueKind};
use crate::key::FormKey;
use crate::node::Schema;
use crate::parse::{is_valid, safe_parse};
use crate::resolve::schemas_at_path;
use crate::strip::{slim, unwrap, StripConfig};
use crate::synth::{generate_value, unwrap_default, zero_value};

/// Upper bound on repair passes over the issue list
const MAX_REPAIR_PASSES: usize = 8;

/// [`SchemaCapability`] backed by a structural [`Schema`]
#[derive(Debug, Clone)]
pub struct StructuralAdapter {
    node: Arc<Schema>,
    form_key: FormKey,
    /// Drafts in lax mode
    lax: Arc<Schema>,
    /// Drafts in strict mode
    strict: Arc<Schema>,
    /// Path resolution for writes
    resolution: Arc<Schema>,
    /// Path-scoped validation
    validation: Arc<Schema>,
}

impl StructuralAdapter {
    /// Create the root adapter of a form
    ///
    /// Optional and nullable wrappers around the root are dropped; a form
    /// document is always present.
    ///
    /// # Errors
    /// Returns [`SchemaError::RootNotObject`] unless the schema is an object
    /// once every wrapper is removed.
    pub fn new(schema: Schema, form_key: FormKey) -> SchemaResult<Self> {
        let (bare, _) = unwrap(&schema, &StripConfig::all());
        if !matches!(bare, Schema::Object(_)) {
            return Err(SchemaError::RootNotObject {
                found: bare.kind_name(),
            });
        }
        let (root, _) = unwrap(&schema, &StripConfig::none().nullable(true).optional(true));
        Ok(Self::nested(root, form_key))
    }

    /// Create an adapter for any node, as handed out by path resolution
    #[must_use]
    pub fn nested(schema: Schema, form_key: FormKey) -> Self {
        let drafts = StripConfig::none().effects(true).default_values(true);
        let lax = slim(&schema, &drafts.clone().refinements(true));
        let strict = slim(&schema, &drafts);

        let (reachable, _) = unwrap(
            &schema,
            &StripConfig::none()
                .default_values(true)
                .nullable(true)
                .optional(true)
                .effects(true),
        );
        let resolution = slim(&reachable, &drafts);

        let (checked, _) = unwrap(
            &schema,
            &StripConfig::none()
                .default_values(true)
                .nullable(true)
                .optional(true),
        );
        let validation = slim(&checked, &StripConfig::none().default_values(true));

        Self {
            node: Arc::new(schema),
            form_key,
            lax: Arc::new(lax),
            strict: Arc::new(strict),
            resolution: Arc::new(resolution),
            validation: Arc::new(validation),
        }
    }

    /// The wrapped schema
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.node
    }

    fn draft_schema(&self, mode: ValidationMode) -> &Schema {
        match mode {
            ValidationMode::Lax => &self.lax,
            ValidationMode::Strict => &self.strict,
        }
    }

    fn to_errors(&self, issues: &[Issue]) -> Vec<ValidationError> {
        issues
            .iter()
            .map(|issue| ValidationError::from_issue(issue, &self.form_key))
            .collect()
    }

    /// Layer constraints over the synthesized value
    ///
    /// Containers merge deeply. Scalars take the constraint only when it
    /// parses on its own; otherwise the synthesized value stays and the
    /// constraint's issues are returned.
    fn layer_constraints(
        &self,
        synthesized: Option<Value>,
        constraints: Option<Value>,
        draft: &Schema,
    ) -> SchemaResult<(Option<Value>, Option<Vec<Issue>>)> {
        let Some(constraints) = constraints else {
            return Ok((synthesized, None));
        };

        let container_base = match &synthesized {
            Some(base) if is_container(base) => Some(base.clone()),
            _ if is_container(&constraints) => {
                generate_value(self.node.peel(), false)?.filter(is_container)
            }
            _ => None,
        };
        if let Some(base) = container_base {
            return Ok((Some(cx_path::deep_merge(&base, &constraints)), None));
        }

        match safe_parse(draft, Some(&constraints)) {
            Ok(_) => Ok((Some(constraints), None)),
            Err(issues) => Ok((synthesized, Some(issues))),
        }
    }

    fn repair(&self, raw: Option<Value>, draft: &Schema) -> SchemaResult<Option<Value>> {
        let mut repaired = raw;
        for pass in 0..MAX_REPAIR_PASSES {
            let issues = match safe_parse(draft, repaired.as_ref()) {
                Ok(_) => return Ok(repaired),
                Err(issues) => issues,
            };
            tracing::trace!(form_key = %self.form_key, pass, issues = issues.len(), "repair pass");

            let mut changed = false;
            for issue in &issues {
                if let Some(next) = self.fix_issue(issue, repaired.as_ref(), draft)? {
                    if next != repaired {
                        repaired = next;
                        changed = true;
                    }
                }
                if is_valid(draft, repaired.as_ref()) {
                    return Ok(repaired);
                }
            }
            if !changed {
                break;
            }
        }
        Ok(repaired)
    }

    /// Apply the fix for one issue, choosing among the governing schemas
    ///
    /// The first candidate whose fix clears the issue's path wins; if none
    /// does, the first applicable fix is used. Undeclared keys are dropped
    /// from the object that holds them.
    fn fix_issue(
        &self,
        issue: &Issue,
        current: Option<&Value>,
        draft: &Schema,
    ) -> SchemaResult<Option<Option<Value>>> {
        let path = issue.path_string();
        if let IssueKind::UnrecognizedKeys { keys } = &issue.kind {
            return Ok(drop_keys(current, &path, keys));
        }
        let candidates = schemas_at_path(draft, &path);
        if candidates.is_empty() {
            tracing::debug!(form_key = %self.form_key, path = %path, "no schema governs issue path");
            return Ok(None);
        }

        let declared = schemas_at_path(&self.node, &path)
            .into_iter()
            .find_map(unwrap_default);

        let mut fallback = None;
        for candidate in candidates {
            let Some(fix) = fix_for(issue, candidate, declared)? else {
                continue;
            };
            let mut trial = current.cloned();
            apply_fix(&mut trial, &path, fix);
            if !has_issue_at(draft, trial.as_ref(), &issue.path) {
                return Ok(Some(trial));
            }
            if fallback.is_none() {
                fallback = Some(trial);
            }
        }
        Ok(fallback)
    }
}

fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// Replacement value for the location of `issue`, if the kind is repairable
///
/// `declared` is the default declared at that path in the full schema.
fn fix_for(
    issue: &Issue,
    schema: &Schema,
    declared: Option<&Value>,
) -> SchemaResult<Option<Value>> {
    let fix = match &issue.kind {
        IssueKind::InvalidType { expected, .. } => {
            generate_value(schema.peel(), false)?.or_else(|| zero_value(*expected))
        }
        IssueKind::InvalidEnumValue { options, .. } => declared
            .or_else(|| unwrap_default(schema))
            .cloned()
            .or_else(|| options.first().map(|o| Value::String(o.clone()))),
        IssueKind::InvalidLiteral { expected } => Some(expected.clone()),
        IssueKind::InvalidUnionDiscriminator { options } => options.first().cloned(),
        IssueKind::InvalidUnion => generate_value(schema.peel(), false)?,
        _ => None,
    };
    Ok(fix)
}

fn drop_keys(current: Option<&Value>, path: &str, keys: &[String]) -> Option<Option<Value>> {
    let mut trial = current.cloned();
    let object = trial
        .as_mut()
        .and_then(|document| resolve_mut(document, path))
        .and_then(Value::as_object_mut)?;
    for key in keys {
        object.shift_remove(key);
    }
    Some(trial)
}

fn apply_fix(document: &mut Option<Value>, path: &str, fix: Value) {
    if path.is_empty() {
        *document = Some(fix);
        return;
    }
    let target = document.get_or_insert_with(|| Value::Object(Map::new()));
    if let Err(err) = set_at(target, path, fix) {
        tracing::debug!(path, error = %err, "repair fix not applicable");
    }
}

fn has_issue_at(schema: &Schema, value: Option<&Value>, path: &[PathSegment]) -> bool {
    match safe_parse(schema, value) {
        Ok(_) => false,
        Err(issues) => issues.iter().any(|issue| issue.path == path),
    }
}

impl SchemaCapability for StructuralAdapter {
    fn initial_state(&self, options: InitialStateOptions) -> SchemaResult<InitialState> {
        let draft = self.draft_schema(options.mode);
        let synthesized = generate_value(&self.node, options.use_defaults)?;
        let (raw, rejected) = self.layer_constraints(synthesized, options.constraints, draft)?;

        let (data, issues) = match safe_parse(draft, raw.as_ref()) {
            Ok(data) => (data, rejected.unwrap_or_default()),
            Err(issues) => {
                tracing::debug!(
                    form_key = %self.form_key,
                    issues = issues.len(),
                    "repairing initial state"
                );
                let repaired = self.repair(raw, draft)?;
                let data = safe_parse(draft, repaired.as_ref()).map_err(|residual| {
                    tracing::error!(form_key = %self.form_key, "initial state could not be repaired");
                    SchemaError::unrepairable(&residual)
                })?;
                (data, issues)
            }
        };

        Ok(InitialState {
            data,
            success: issues.is_empty(),
            errors: self.to_errors(&issues),
        })
    }

    fn schemas_at_path(&self, path: &str) -> Vec<Arc<dyn SchemaCapability>> {
        let found = schemas_at_path(&self.resolution, path);
        if found.is_empty() {
            tracing::error!(form_key = %self.form_key, path, "no schema found at path");
        }
        found
            .into_iter()
            .map(|schema| {
                Arc::new(Self::nested(schema.clone(), self.form_key.clone()))
                    as Arc<dyn SchemaCapability>
            })
            .collect()
    }

    fn validate_at_path(&self, data: Option<&Value>, path: Option<&str>) -> ValidationOutcome {
        let Some(path) = path else {
            return match safe_parse(&self.node, data) {
                Ok(data) => ValidationOutcome::Valid { data },
                Err(issues) => ValidationOutcome::Invalid {
                    errors: self.to_errors(&issues),
                    data: None,
                },
            };
        };

        let base = parse_segments(path);
        let candidates = schemas_at_path(&self.validation, path);
        if candidates.is_empty() {
            return ValidationOutcome::Invalid {
                errors: vec![ValidationError::new(
                    format!("No schema found at path '{path}'"),
                    base,
                    self.form_key.clone(),
                )],
                data: None,
            };
        }

        let mut errors = Vec::new();
        for candidate in candidates {
            match safe_parse(candidate, data) {
                Ok(data) => return ValidationOutcome::Valid { data },
                Err(issues) => errors.extend(
                    self.to_errors(&issues)
                        .into_iter()
                        .map(|err| err.prefixed(&base)),
                ),
            }
        }
        ValidationOutcome::Invalid { errors, data: None }
    }

    fn form_key(&self) -> &FormKey {
        &self.form_key
    }
}
