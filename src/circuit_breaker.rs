use failsafe::{backoff, failure_policy, Config, StateMachine};
use std::time::Duration;

/// Concrete breaker type so the API clients can hold one as a plain field.
pub type ApiCircuitBreaker =
    StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>;

/// Builds the circuit breaker that guards outbound HTTP transports.
///
/// Five consecutive transport failures open the circuit; while it is open,
/// calls are rejected immediately instead of queueing behind an upstream
/// that is already down. Recovery probes back off exponentially, starting
/// at 10 seconds and capped at 60.
///
/// The breaker wraps only the send itself. Responses that arrive with an
/// error status are counted by the retry policy, not here, so a run of
/// 429s from WorkflowMax cannot wedge the client shut.
pub fn create_api_circuit_breaker() -> ApiCircuitBreaker {
    let backoff_strategy =
        backoff::exponential(Duration::from_secs(10), Duration::from_secs(60));
    let failure_policy = failure_policy::consecutive_failures(5, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}
