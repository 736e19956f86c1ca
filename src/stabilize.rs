//! Screenshot stabilization.
//!
//! Slide pages finish rendering asynchronously (fonts, transition
//! animations, staged reveals), so a single screenshot taken right after
//! navigation can catch the page mid-flight. The settle loop keeps
//! re-capturing at a fixed interval until two consecutive captures are
//! byte-identical, giving up after a bounded number of polls and returning
//! the last capture as a best effort. Total wall time is therefore bounded
//! by `timeout + wait_limit * wait_interval`.

use std::time::Duration;

use log::{debug, warn};

use crate::{RenderSession, Renderer, Result};

/// Knobs for one render-and-settle attempt.
#[derive(Debug, Clone, Copy)]
pub struct StabilizePolicy {
    /// Navigation timeout.
    pub timeout: Duration,
    /// Sleep between consecutive captures.
    pub wait_interval: Duration,
    /// Maximum number of re-captures after the initial one.
    pub wait_limit: u32,
}

impl Default for StabilizePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(15000),
            wait_interval: Duration::from_millis(100),
            wait_limit: 10,
        }
    }
}

/// Render `url` in a fresh session and return a settled screenshot.
///
/// The session is released on every exit path; a close failure is logged,
/// not propagated, so it can never mask the render result.
pub fn settled_screenshot<R: Renderer>(
    renderer: &R,
    url: &str,
    policy: StabilizePolicy,
) -> Result<Vec<u8>> {
    let mut session = renderer.open_session()?;
    let result = settle(&mut session, url, policy);
    if let Err(err) = session.close() {
        warn!("failed to close render session for {}: {}", url, err);
    }
    result
}

fn settle<S: RenderSession>(session: &mut S, url: &str, policy: StabilizePolicy) -> Result<Vec<u8>> {
    session.navigate(url, policy.timeout)?;

    let mut prev = session.capture()?;
    for poll in 0..policy.wait_limit {
        std::thread::sleep(policy.wait_interval);
        let curr = session.capture()?;
        if curr == prev {
            debug!("page settled after {} poll(s): {}", poll + 1, url);
            return Ok(curr);
        }
        prev = curr;
    }

    // Still changing after the whole budget; accept the last capture rather
    // than block forever.
    debug!(
        "page did not settle within {} polls, keeping last capture: {}",
        policy.wait_limit, url
    );
    Ok(prev)
}
