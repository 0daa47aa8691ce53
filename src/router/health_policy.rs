use crate::domain::health::{ProcessorHealth, ProcessorName};

/// Above this floor the default processor is considered too slow.
pub const MAX_DEFAULT_RESPONSE_TIME_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Use(ProcessorName),
    AllDown,
}

/// Picks a processor from the last known health of both.
///
/// `None` means the health lookup for that processor failed.
pub fn choose_processor(
    default: Option<&ProcessorHealth>,
    fallback: Option<&ProcessorHealth>,
) -> RouteDecision {
    match (default, fallback) {
        (None, None) => RouteDecision::AllDown,
        (None, Some(_)) => RouteDecision::Use(ProcessorName::Fallback),
        (Some(_), None) => RouteDecision::Use(ProcessorName::Default),
        (Some(d), Some(f)) => match (d.failing, f.failing) {
            (true, true) => RouteDecision::AllDown,
            (true, false) => RouteDecision::Use(ProcessorName::Fallback),
            (false, true) => RouteDecision::Use(ProcessorName::Default),
            (false, false) if d.min_response_time_ms > MAX_DEFAULT_RESPONSE_TIME_MS => {
                RouteDecision::Use(ProcessorName::Fallback)
            }
            (false, false) => RouteDecision::Use(ProcessorName::Default),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(ms: u64) -> ProcessorHealth {
        ProcessorHealth::healthy(ms)
    }

    fn down() -> ProcessorHealth {
        ProcessorHealth::failing()
    }

    #[test]
    fn prefers_default_when_both_healthy() {
        assert_eq!(
            choose_processor(Some(&ok(10)), Some(&ok(10))),
            RouteDecision::Use(ProcessorName::Default)
        );
    }

    #[test]
    fn slow_default_diverts_to_fallback() {
        assert_eq!(
            choose_processor(Some(&ok(6_000)), Some(&ok(10))),
            RouteDecision::Use(ProcessorName::Fallback)
        );
        assert_eq!(
            choose_processor(Some(&ok(MAX_DEFAULT_RESPONSE_TIME_MS)), Some(&ok(10))),
            RouteDecision::Use(ProcessorName::Default)
        );
    }

    #[test]
    fn failing_processor_is_avoided() {
        assert_eq!(
            choose_processor(Some(&down()), Some(&ok(10))),
            RouteDecision::Use(ProcessorName::Fallback)
        );
        assert_eq!(
            choose_processor(Some(&ok(10)), Some(&down())),
            RouteDecision::Use(ProcessorName::Default)
        );
        assert_eq!(
            choose_processor(Some(&ok(9_000)), Some(&down())),
            RouteDecision::Use(ProcessorName::Default)
        );
    }

    #[test]
    fn both_failing_is_all_down() {
        assert_eq!(choose_processor(Some(&down()), Some(&down())), RouteDecision::AllDown);
    }

    #[test]
    fn unknown_health_routes_to_the_known_one() {
        assert_eq!(
            choose_processor(None, Some(&ok(10))),
            RouteDecision::Use(ProcessorName::Fallback)
        );
        assert_eq!(
            choose_processor(Some(&ok(10)), None),
            RouteDecision::Use(ProcessorName::Default)
        );
        // a known-failing processor still beats an unknown one
        assert_eq!(
            choose_processor(None, Some(&down())),
            RouteDecision::Use(ProcessorName::Fallback)
        );
        assert_eq!(choose_processor(None, None), RouteDecision::AllDown);
    }
}
