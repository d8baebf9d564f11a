use std::cmp::Ordering;

pub mod validation;

/// Indices of the `k` highest scores, best first. Equal scores keep input order.
pub fn top_k_indices(scores: &[f32], k: usize) -> Vec<usize> {
    let mut indexed_scores: Vec<(usize, f32)> = scores
        .iter()
        .enumerate()
        .map(|(i, &score)| (i, score))
        .collect();

    indexed_scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    indexed_scores
        .into_iter()
        .take(k)
        .map(|(i, _)| i)
        .collect()
}

pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    max_retries: usize,
    initial_delay: std::time::Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
{
    let mut delay = initial_delay;
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    "Operation failed (attempt {}), retrying in {:?}: {:?}",
                    attempt,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_top_k_indices() {
        let scores = vec![0.1, 0.5, 0.3, 0.9, 0.2];
        let top_2 = top_k_indices(&scores, 2);
        assert_eq!(top_2, vec![3, 1]);

        let ties = vec![1.0, 2.0, 2.0];
        assert_eq!(top_k_indices(&ties, 5), vec![1, 2, 0]);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let mut calls = 0;
        let result: Result<u32, String> = retry_with_backoff(
            || {
                calls += 1;
                let current = calls;
                async move {
                    if current < 3 {
                        Err(format!("attempt {} failed", current))
                    } else {
                        Ok(current)
                    }
                }
            },
            5,
            Duration::from_millis(1),
        )
        .await;

        assert_eq!(result, Ok(3));
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let mut calls = 0;
        let result: Result<(), &str> = retry_with_backoff(
            || {
                calls += 1;
                async { Err("still broken") }
            },
            2,
            Duration::from_millis(1),
        )
        .await;

        assert_eq!(result, Err("still broken"));
        assert_eq!(calls, 3);
    }
}
