use rand::seq::SliceRandom;
use rand::Rng;

/// Supplies the `User-Agent` value for a single request.
pub trait UserAgentSource: Send + Sync {
    fn user_agent(&self) -> String;
}

/// Desktop browser identities with randomized version numbers.
/// Every call may return a different value.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomUserAgent;

const PLATFORMS: [&str; 5] = [
    "Windows NT 10.0; Win64; x64",
    "Windows NT 6.1; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux x86_64",
];

impl UserAgentSource for RandomUserAgent {
    fn user_agent(&self) -> String {
        let mut rng = rand::thread_rng();
        // Never empty, the fallback is unreachable.
        let platform = PLATFORMS.choose(&mut rng).copied().unwrap_or(PLATFORMS[0]);

        match rng.gen_range(0..3) {
            0 => {
                let major = rng.gen_range(100..=126);
                let build = rng.gen_range(4000..=6500);
                format!(
                    "Mozilla/5.0 ({platform}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{major}.0.{build}.0 Safari/537.36"
                )
            }
            1 => {
                let major = rng.gen_range(100..=128);
                format!("Mozilla/5.0 ({platform}; rv:{major}.0) Gecko/20100101 Firefox/{major}.0")
            }
            _ => {
                let major = rng.gen_range(100..=126);
                let build = rng.gen_range(1000..=2600);
                format!(
                    "Mozilla/5.0 ({platform}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{major}.0.0.0 Safari/537.36 Edg/{major}.0.{build}.0"
                )
            }
        }
    }
}

/// Always the same value. Used when the user agent is pinned in the config.
#[derive(Debug, Clone)]
pub struct FixedUserAgent(pub String);

impl UserAgentSource for FixedUserAgent {
    fn user_agent(&self) -> String {
        self.0.clone()
    }
}
