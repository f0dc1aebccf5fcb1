use mapalgebra::resilience::RetryPolicy;
use tokio::time::Duration;

#[test]
fn test_never_policy() {
    let policy = RetryPolicy::default();

    assert_eq!(policy, RetryPolicy::Never);
    assert_eq!(policy.delay_before(1), None);
}

#[test]
fn test_immediate_policy() {
    let policy = RetryPolicy::Immediate { max_attempts: 3 };

    assert_eq!(policy.delay_before(1), Some(Duration::ZERO));
    assert_eq!(policy.delay_before(2), Some(Duration::ZERO));
    assert_eq!(policy.delay_before(3), None);
}

#[test]
fn test_exponential_policy() {
    let policy = RetryPolicy::Exponential {
        base_ms: 100,
        max_ms: 350,
        max_attempts: 5,
    };

    assert_eq!(policy.delay_before(1), Some(Duration::from_millis(100)));
    assert_eq!(policy.delay_before(2), Some(Duration::from_millis(200)));
    assert_eq!(policy.delay_before(3), Some(Duration::from_millis(350)));
    assert_eq!(policy.delay_before(5), None);
}
