//! Alert condition evaluation.
//!
//! A condition is a plain `<field> <op> <value>` expression supplied by
//! configuration, e.g. `"mem_free <= 1024M"` or `"fgc.interval_sec < 60"`.
//! A bare field is implicitly prefixed with the default object `sys`. The
//! threshold accepts a K/M/G/T byte-size suffix which is converted to bytes
//! before comparison.
//!
//! Evaluation is three-valued: triggered, not triggered, or *skipped* —
//! an object that is not registered yet (no process being watched, no GC
//! event of the class seen) and a value that is not yet meaningful (the
//! first-event interval sentinel) are not errors, the condition simply
//! cannot be judged this cycle. Genuine configuration mistakes (unknown
//! operator, object or field) are reported as [`AlertError`] for the
//! dispatching side to log.

pub mod snapshot;

use crate::model::{GcEvent, HEAP_GENERATION};
use crate::store::GcEventStore;

pub use snapshot::{ProcessSnapshot, SystemSnapshot};

/// Object name assumed when a condition names a bare field.
pub const DEFAULT_OBJECT: &str = "sys";

/// Comparison operator of a condition expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CmpOp {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "=" => Some(CmpOp::Eq),
            ">" => Some(CmpOp::Gt),
            "<" => Some(CmpOp::Lt),
            ">=" => Some(CmpOp::Ge),
            "<=" => Some(CmpOp::Le),
            _ => None,
        }
    }

    fn apply(self, value: f64, threshold: f64) -> bool {
        match self {
            CmpOp::Eq => value == threshold,
            CmpOp::Gt => value > threshold,
            CmpOp::Lt => value < threshold,
            CmpOp::Ge => value >= threshold,
            CmpOp::Le => value <= threshold,
        }
    }
}

impl std::fmt::Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CmpOp::Eq => "=",
            CmpOp::Gt => ">",
            CmpOp::Lt => "<",
            CmpOp::Ge => ">=",
            CmpOp::Le => "<=",
        };
        f.write_str(s)
    }
}

/// Configuration or semantic error in a condition. Raised to the caller;
/// the dispatching side logs it and keeps the session alive.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertError {
    /// Not a three-part `<field> <op> <value>` expression.
    BadExpression(String),
    UnknownOperator(String),
    BadThreshold(String),
    UnknownObject(String),
    UnknownField { object: String, field: String },
}

impl std::fmt::Display for AlertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertError::BadExpression(expr) => {
                write!(f, "expected '<field> <op> <value>', got: {}", expr)
            }
            AlertError::UnknownOperator(op) => write!(f, "unknown operator: {}", op),
            AlertError::BadThreshold(value) => write!(f, "invalid threshold: {}", value),
            AlertError::UnknownObject(object) => write!(f, "unknown object: {}", object),
            AlertError::UnknownField { object, field } => {
                write!(f, "object {} has no field {}", object, field)
            }
        }
    }
}

impl std::error::Error for AlertError {}

/// A parsed alert condition.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertCondition {
    pub object: String,
    pub field: String,
    pub op: CmpOp,
    /// Threshold after unit conversion.
    pub threshold: f64,
    /// Threshold as written, for messages.
    pub threshold_text: String,
}

impl AlertCondition {
    /// Parses `<field> <op> <value>`, applying the implicit `sys.` prefix
    /// and the K/M/G/T byte-size suffix.
    pub fn parse(expr: &str) -> Result<Self, AlertError> {
        let parts: Vec<&str> = expr.split_whitespace().collect();
        let &[field, op, value] = parts.as_slice() else {
            return Err(AlertError::BadExpression(expr.to_string()));
        };

        let op = CmpOp::parse(op).ok_or_else(|| AlertError::UnknownOperator(op.to_string()))?;
        let (object, field) = match field.split_once('.') {
            Some((object, field)) => (object.to_string(), field.to_string()),
            None => (DEFAULT_OBJECT.to_string(), field.to_string()),
        };
        let threshold =
            parse_threshold(value).ok_or_else(|| AlertError::BadThreshold(value.to_string()))?;

        Ok(Self {
            object,
            field,
            op,
            threshold,
            threshold_text: value.to_string(),
        })
    }

    /// Human-readable trigger message: `"<object>.<field>(<value>) <op> <threshold>"`.
    pub fn message(&self, value: f64) -> String {
        format!(
            "{}.{}({}) {} {}",
            self.object, self.field, value, self.op, self.threshold_text
        )
    }
}

/// Parses a threshold number with an optional K/M/G/T byte-size suffix
/// (1024 base), case-insensitive.
fn parse_threshold(s: &str) -> Option<f64> {
    const UNITS: &[(char, f64)] = &[
        ('K', 1024.0),
        ('M', 1024.0 * 1024.0),
        ('G', 1024.0 * 1024.0 * 1024.0),
        ('T', 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ];
    for &(unit, multiplier) in UNITS {
        if let Some(number) = s
            .strip_suffix(unit)
            .or_else(|| s.strip_suffix(unit.to_ascii_lowercase()))
        {
            return number.parse::<f64>().ok().map(|v| v * multiplier);
        }
    }
    s.parse::<f64>().ok()
}

/// A field value read from a data source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Num(f64),
    /// Present but not yet meaningful (e.g. the first-event interval
    /// sentinel); the condition is skipped this cycle.
    NotReady,
}

/// A named bag of numeric fields an alert condition can read.
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<FieldValue>;
}

/// Result of resolving an object name.
pub enum Resolved<'a> {
    Source(&'a dyn FieldSource),
    /// Known object, no data behind it yet — the condition is skipped.
    NotRegistered,
    /// Not a known object name — a configuration error.
    Unknown,
}

/// Maps object names (`sys`, `proc`, `ygc`, `fgc`, ...) to live sources.
pub trait ObjectResolver {
    fn resolve(&self, object: &str) -> Resolved<'_>;
}

/// Why a condition could not be judged this cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    ObjectNotRegistered(String),
    ValueNotReady(String),
}

/// Outcome of evaluating one condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Triggered { value: f64, message: String },
    NotTriggered { value: f64 },
    Skipped(SkipReason),
}

/// Evaluates one condition against the resolver's current data.
pub fn evaluate(
    condition: &AlertCondition,
    resolver: &dyn ObjectResolver,
) -> Result<Evaluation, AlertError> {
    let source = match resolver.resolve(&condition.object) {
        Resolved::Source(source) => source,
        Resolved::NotRegistered => {
            return Ok(Evaluation::Skipped(SkipReason::ObjectNotRegistered(
                condition.object.clone(),
            )));
        }
        Resolved::Unknown => return Err(AlertError::UnknownObject(condition.object.clone())),
    };

    let value = match source.field(&condition.field) {
        Some(FieldValue::Num(value)) => value,
        Some(FieldValue::NotReady) => {
            return Ok(Evaluation::Skipped(SkipReason::ValueNotReady(format!(
                "{}.{}",
                condition.object, condition.field
            ))));
        }
        None => {
            return Err(AlertError::UnknownField {
                object: condition.object.clone(),
                field: condition.field.clone(),
            });
        }
    };

    if condition.op.apply(value, condition.threshold) {
        Ok(Evaluation::Triggered {
            value,
            message: condition.message(value),
        })
    } else {
        Ok(Evaluation::NotTriggered { value })
    }
}

impl FieldSource for GcEvent {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "jvm_time_sec" => Some(FieldValue::Num(self.jvm_time_sec)),
            "cost_time_sec" => Some(FieldValue::Num(self.cost_time_sec())),
            // interval_sec == 0 marks the first event of its class: there is
            // no prior reference, so the value is not yet meaningful.
            "interval_sec" => {
                if self.interval_sec == 0.0 {
                    Some(FieldValue::NotReady)
                } else {
                    Some(FieldValue::Num(self.interval_sec))
                }
            }
            _ => {
                let (generation, field) = name.split_once('.')?;
                let value = if generation == HEAP_GENERATION {
                    match field {
                        "before_kb" => self.heap.before_kb,
                        "after_kb" => self.heap.after_kb,
                        "total_kb" => self.heap.total_kb,
                        "cost_time_sec" => self.heap.cost_time_sec,
                        _ => return None,
                    }
                } else {
                    let delta = self.generation(generation)?;
                    match field {
                        "before_kb" => delta.before_kb,
                        "after_kb" => delta.after_kb,
                        "total_kb" => delta.total_kb,
                        "cost_time_sec" => delta.cost_time_sec?,
                        _ => return None,
                    }
                };
                Some(FieldValue::Num(value))
            }
        }
    }
}

/// Ready-made resolver over a session's data: `sys` and `proc` snapshots
/// (filled by external samplers) plus `ygc`/`fgc`, the most recent minor and
/// full GC event in the store.
#[derive(Default)]
pub struct SessionResolver<'a> {
    pub sys: Option<&'a SystemSnapshot>,
    pub proc: Option<&'a ProcessSnapshot>,
    pub store: Option<&'a GcEventStore>,
}

impl ObjectResolver for SessionResolver<'_> {
    fn resolve(&self, object: &str) -> Resolved<'_> {
        match object {
            "sys" => match self.sys {
                Some(sys) => Resolved::Source(sys),
                None => Resolved::NotRegistered,
            },
            "proc" => match self.proc {
                Some(proc) => Resolved::Source(proc),
                None => Resolved::NotRegistered,
            },
            "ygc" => self.latest_gc(false),
            "fgc" => self.latest_gc(true),
            _ => Resolved::Unknown,
        }
    }
}

impl SessionResolver<'_> {
    fn latest_gc(&self, is_full: bool) -> Resolved<'_> {
        match self.store.and_then(|store| store.last_of_class(is_full)) {
            Some(event) => Resolved::Source(event),
            None => Resolved::NotRegistered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::session::MonitoringSession;

    const MINOR_1: &str = "0.084: [GC (Allocation Failure) [PSYoungGen: 1525K->512K(1536K)] 3556K->2886K(5632K), 0.0039928 secs]";
    const MINOR_2: &str = "0.200: [GC (Allocation Failure) [PSYoungGen: 900K->400K(1536K)] 3000K->2500K(5632K), 0.002 secs]";

    #[test]
    fn test_parse_bare_field_gets_sys_prefix() {
        let condition = AlertCondition::parse("mem_free <= 1024M").unwrap();
        assert_eq!(condition.object, "sys");
        assert_eq!(condition.field, "mem_free");
        assert_eq!(condition.op, CmpOp::Le);
        assert_eq!(condition.threshold, 1024.0 * 1024.0 * 1024.0);
        assert_eq!(condition.threshold_text, "1024M");
    }

    #[test]
    fn test_parse_dotted_field() {
        let condition = AlertCondition::parse("fgc.interval_sec < 60").unwrap();
        assert_eq!(condition.object, "fgc");
        assert_eq!(condition.field, "interval_sec");
        assert_eq!(condition.threshold, 60.0);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            AlertCondition::parse("mem_free <="),
            Err(AlertError::BadExpression(_))
        ));
        assert!(matches!(
            AlertCondition::parse("mem_free != 5"),
            Err(AlertError::UnknownOperator(_))
        ));
        assert!(matches!(
            AlertCondition::parse("mem_free <= lots"),
            Err(AlertError::BadThreshold(_))
        ));
    }

    #[test]
    fn test_threshold_units() {
        assert_eq!(parse_threshold("2K"), Some(2048.0));
        assert_eq!(parse_threshold("1g"), Some(1024.0 * 1024.0 * 1024.0));
        assert_eq!(parse_threshold("1.5"), Some(1.5));
        assert_eq!(parse_threshold("x"), None);
    }

    #[test]
    fn test_sys_condition_triggers_with_unit_conversion() {
        let condition = AlertCondition::parse("mem_free <= 1024M").unwrap();
        let sys = SystemSnapshot {
            mem_free: 500.0 * 1024.0 * 1024.0,
            ..SystemSnapshot::default()
        };
        let resolver = SessionResolver {
            sys: Some(&sys),
            ..SessionResolver::default()
        };

        match evaluate(&condition, &resolver).unwrap() {
            Evaluation::Triggered { value, message } => {
                assert_eq!(value, 500.0 * 1024.0 * 1024.0);
                assert_eq!(message, "sys.mem_free(524288000) <= 1024M");
            }
            other => panic!("expected trigger, got {:?}", other),
        }
    }

    #[test]
    fn test_unregistered_object_is_skipped() {
        let condition = AlertCondition::parse("proc.cpu_percent > 90").unwrap();
        let resolver = SessionResolver::default();
        assert_eq!(
            evaluate(&condition, &resolver).unwrap(),
            Evaluation::Skipped(SkipReason::ObjectNotRegistered("proc".to_string()))
        );
    }

    #[test]
    fn test_unknown_object_is_error() {
        let condition = AlertCondition::parse("db.connections > 10").unwrap();
        let resolver = SessionResolver::default();
        assert_eq!(
            evaluate(&condition, &resolver).unwrap_err(),
            AlertError::UnknownObject("db".to_string())
        );
    }

    #[test]
    fn test_unknown_field_is_error() {
        let condition = AlertCondition::parse("sys.nope > 1").unwrap();
        let sys = SystemSnapshot::default();
        let resolver = SessionResolver {
            sys: Some(&sys),
            ..SessionResolver::default()
        };
        assert!(matches!(
            evaluate(&condition, &resolver),
            Err(AlertError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_first_gc_interval_is_skipped_then_evaluated() {
        let mut session = MonitoringSession::new(MonitorConfig::default());
        session.feed_line(MINOR_1).unwrap();

        let condition = AlertCondition::parse("ygc.interval_sec < 1").unwrap();
        {
            let resolver = SessionResolver {
                store: Some(session.store()),
                ..SessionResolver::default()
            };
            assert!(matches!(
                evaluate(&condition, &resolver).unwrap(),
                Evaluation::Skipped(SkipReason::ValueNotReady(_))
            ));
        }

        session.feed_line(MINOR_2).unwrap();
        let resolver = SessionResolver {
            store: Some(session.store()),
            ..SessionResolver::default()
        };
        assert!(matches!(
            evaluate(&condition, &resolver).unwrap(),
            Evaluation::Triggered { .. }
        ));
    }

    #[test]
    fn test_no_gc_events_yet_is_skipped() {
        let condition = AlertCondition::parse("fgc.cost_time_sec > 1").unwrap();
        let store = GcEventStore::new();
        let resolver = SessionResolver {
            store: Some(&store),
            ..SessionResolver::default()
        };
        assert_eq!(
            evaluate(&condition, &resolver).unwrap(),
            Evaluation::Skipped(SkipReason::ObjectNotRegistered("fgc".to_string()))
        );
    }

    #[test]
    fn test_gc_event_generation_fields() {
        let mut session = MonitoringSession::new(MonitorConfig::default());
        session.feed_line(MINOR_1).unwrap();

        let condition = AlertCondition::parse("ygc.PSYoungGen.after_kb >= 512").unwrap();
        assert_eq!(condition.object, "ygc");
        assert_eq!(condition.field, "PSYoungGen.after_kb");

        let resolver = SessionResolver {
            store: Some(session.store()),
            ..SessionResolver::default()
        };
        assert!(matches!(
            evaluate(&condition, &resolver).unwrap(),
            Evaluation::Triggered { .. }
        ));
    }
}
