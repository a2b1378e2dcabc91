//! Gateway pool and endpoint selection.

use std::net::TcpStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use url::Url;

use super::errors::{StorageError, StorageResult};
use crate::config::StorageSettings;
use crate::models::SelectionPolicy;

/// Reachability check used by health-aware selection.
pub trait ReachabilityCheck {
    fn is_reachable(&self, endpoint: &str, timeout: Duration) -> bool;
}

/// Checks an endpoint by opening a TCP connection to its host and port.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnectCheck;

impl ReachabilityCheck for TcpConnectCheck {
    fn is_reachable(&self, endpoint: &str, timeout: Duration) -> bool {
        let Ok(url) = Url::parse(endpoint) else {
            return false;
        };
        let Ok(addrs) = url.socket_addrs(|| None) else {
            return false;
        };
        addrs
            .iter()
            .any(|addr| TcpStream::connect_timeout(addr, timeout).is_ok())
    }
}

/// Interchangeable storage gateways plus the policy for picking one.
#[derive(Debug)]
pub struct EndpointPool {
    endpoints: Vec<String>,
    policy: SelectionPolicy,
    connect_timeout: Duration,
    /// Next index for round-robin.
    cursor: AtomicUsize,
}

impl EndpointPool {
    /// Create a pool, validating every endpoint URL.
    pub fn new(endpoints: Vec<String>, policy: SelectionPolicy) -> StorageResult<Self> {
        if endpoints.is_empty() {
            return Err(StorageError::EmptyPool);
        }
        for endpoint in &endpoints {
            validate_endpoint(endpoint)?;
        }
        Ok(Self {
            endpoints,
            policy,
            connect_timeout: Duration::from_millis(500),
            cursor: AtomicUsize::new(0),
        })
    }

    /// Create a pool from the `[storage]` settings.
    pub fn from_settings(settings: &StorageSettings) -> StorageResult<Self> {
        Ok(Self::new(settings.endpoints.clone(), settings.selection)?
            .with_connect_timeout(Duration::from_millis(settings.connect_timeout_ms)))
    }

    /// Set the connect timeout for health checks.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Selection policy in use.
    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Number of endpoints in the pool.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always false; an empty pool cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Endpoints in configured order.
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Pick one endpoint, connecting over TCP for health-aware selection.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> StorageResult<&str> {
        self.select_with_check(rng, &TcpConnectCheck)
    }

    /// Pick one endpoint with an explicit reachability check.
    ///
    /// Health-aware selection checks endpoints in random order and falls back to the
    /// first candidate of that order when nothing answers.
    pub fn select_with_check<R, P>(&self, rng: &mut R, check: &P) -> StorageResult<&str>
    where
        R: Rng + ?Sized,
        P: ReachabilityCheck + ?Sized,
    {
        let len = self.endpoints.len();
        if len == 0 {
            return Err(StorageError::EmptyPool);
        }

        let index = match self.policy {
            SelectionPolicy::Random => rng.gen_range(0..len),
            SelectionPolicy::RoundRobin => self.cursor.fetch_add(1, Ordering::Relaxed) % len,
            SelectionPolicy::HealthAware => {
                let mut order: Vec<usize> = (0..len).collect();
                order.shuffle(rng);
                match order
                    .iter()
                    .copied()
                    .find(|&i| check.is_reachable(&self.endpoints[i], self.connect_timeout))
                {
                    Some(i) => i,
                    None => {
                        tracing::warn!(
                            "No storage endpoint answered within {:?}; using {}",
                            self.connect_timeout,
                            self.endpoints[order[0]]
                        );
                        order[0]
                    }
                }
            }
        };

        Ok(&self.endpoints[index])
    }
}

fn validate_endpoint(endpoint: &str) -> StorageResult<()> {
    let url = Url::parse(endpoint)
        .map_err(|e| StorageError::invalid_endpoint(endpoint, e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(StorageError::invalid_endpoint(
            endpoint,
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().is_none() {
        return Err(StorageError::invalid_endpoint(endpoint, "missing host"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;

    fn pool(policy: SelectionPolicy) -> EndpointPool {
        EndpointPool::from_settings(&StorageSettings {
            selection: policy,
            ..StorageSettings::default()
        })
        .unwrap()
    }

    /// Reachable only for endpoints containing the marker; records check order.
    struct MarkerCheck {
        marker: &'static str,
        checked: RefCell<Vec<String>>,
    }

    impl ReachabilityCheck for MarkerCheck {
        fn is_reachable(&self, endpoint: &str, _timeout: Duration) -> bool {
            self.checked.borrow_mut().push(endpoint.to_string());
            endpoint.contains(self.marker)
        }
    }

    #[test]
    fn empty_pool_is_rejected() {
        let err = EndpointPool::new(Vec::new(), SelectionPolicy::Random).unwrap_err();
        assert!(matches!(err, StorageError::EmptyPool));
    }

    #[test]
    fn invalid_endpoints_are_rejected() {
        let err = EndpointPool::new(vec!["ftp://10.0.0.1/".to_string()], SelectionPolicy::Random)
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidEndpoint { .. }));

        let err = EndpointPool::new(vec!["not a url".to_string()], SelectionPolicy::Random)
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidEndpoint { .. }));
    }

    #[test]
    fn seeded_random_selection_is_deterministic() {
        let pool = pool(SelectionPolicy::Random);

        let first = pool.select(&mut StdRng::seed_from_u64(42)).unwrap().to_string();
        let second = pool.select(&mut StdRng::seed_from_u64(42)).unwrap().to_string();

        assert_eq!(first, second);
        assert!(pool.endpoints().contains(&first));
    }

    #[test]
    fn random_selection_stays_in_pool() {
        let pool = pool(SelectionPolicy::Random);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let picked = pool.select(&mut rng).unwrap();
            assert!(picked.starts_with("http://10.199.199."));
        }
    }

    #[test]
    fn round_robin_cycles_in_order() {
        let pool = EndpointPool::new(
            vec![
                "http://a:8082/".to_string(),
                "http://b:8082/".to_string(),
            ],
            SelectionPolicy::RoundRobin,
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let picks: Vec<String> = (0..3)
            .map(|_| pool.select(&mut rng).unwrap().to_string())
            .collect();
        assert_eq!(picks, vec!["http://a:8082/", "http://b:8082/", "http://a:8082/"]);
    }

    #[test]
    fn health_aware_picks_reachable_endpoint() {
        let pool = pool(SelectionPolicy::HealthAware);
        let check = MarkerCheck {
            marker: ".90:",
            checked: RefCell::new(Vec::new()),
        };

        let picked = pool
            .select_with_check(&mut StdRng::seed_from_u64(3), &check)
            .unwrap();

        assert_eq!(picked, "http://10.199.199.90:8082/");
        assert!(check.checked.borrow().len() <= pool.len());
    }

    #[test]
    fn health_aware_falls_back_when_nothing_answers() {
        let pool = pool(SelectionPolicy::HealthAware);
        let check = MarkerCheck {
            marker: "nowhere",
            checked: RefCell::new(Vec::new()),
        };

        let picked = pool
            .select_with_check(&mut StdRng::seed_from_u64(3), &check)
            .unwrap()
            .to_string();

        assert_eq!(check.checked.borrow().len(), pool.len());
        assert_eq!(picked, check.checked.borrow()[0]);
    }
}
