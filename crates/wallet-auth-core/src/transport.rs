/*
[INPUT]:  Terminal AuthPayload, environment classification, return url, origin policy
[OUTPUT]: One best-effort delivery through the highest-precedence channel
[POS]:    Transport layer - native bridge, deep-link redirect, postMessage
[UPDATE]: When channel precedence or message targeting changes
*/

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::environment::{Environment, EnvironmentDetector};
use crate::error::Result;
use crate::host::{HostWindow, MessageTarget};
use crate::origin::OriginPolicy;
use crate::return_url::{ReturnUrlResolver, build_redirect_url};
use crate::types::AuthPayload;

/// Channel a result was handed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    NativeBridge,
    Redirect,
    Opener,
    Parent,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::NativeBridge => "native_bridge",
            Channel::Redirect => "redirect",
            Channel::Opener => "opener",
            Channel::Parent => "parent",
        };
        f.write_str(name)
    }
}

/// Outcome of a dispatch: the last channel tried and whether it accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub channel: Channel,
    pub accepted: bool,
}

/// Picks and drives the channel that hands a result back to the host
pub struct TransportDispatcher {
    host: Arc<dyn HostWindow>,
    detector: Arc<dyn EnvironmentDetector>,
    return_urls: ReturnUrlResolver,
    origins: OriginPolicy,
}

impl TransportDispatcher {
    pub fn new(
        host: Arc<dyn HostWindow>,
        detector: Arc<dyn EnvironmentDetector>,
        return_urls: ReturnUrlResolver,
        origins: OriginPolicy,
    ) -> Self {
        Self {
            host,
            detector,
            return_urls,
            origins,
        }
    }

    /// True if some channel was attempted; says nothing about receipt
    pub fn deliver(&self, payload: &AuthPayload) -> bool {
        self.dispatch(payload).is_some()
    }

    /// Deliver and report which channel was used.
    ///
    /// Channel failures are logged and swallowed. A failed redirect falls
    /// through to postMessage; a native bridge attempt is always final.
    pub fn dispatch(&self, payload: &AuthPayload) -> Option<Delivery> {
        let environment = self.detector.detect();
        if !environment.can_act() {
            debug!("no window; delivery skipped");
            return None;
        }

        if environment.is_native_bridge {
            let accepted = self.log_outcome(Channel::NativeBridge, payload, self.send_native(payload));
            return Some(Delivery {
                channel: Channel::NativeBridge,
                accepted,
            });
        }

        let mut last = None;
        if let Some(return_url) = self.return_urls.resolve() {
            let accepted = self.log_outcome(Channel::Redirect, payload, self.redirect(&return_url, payload));
            if accepted {
                return Some(Delivery {
                    channel: Channel::Redirect,
                    accepted,
                });
            }
            last = Some(Delivery {
                channel: Channel::Redirect,
                accepted,
            });
        }

        self.post_to_host(&environment, payload).or(last)
    }

    fn send_native(&self, payload: &AuthPayload) -> Result<()> {
        let text = payload.to_json()?;
        self.host.send_to_native_bridge(&text)
    }

    fn redirect(&self, return_url: &str, payload: &AuthPayload) -> Result<()> {
        let url = build_redirect_url(return_url, payload)?;
        self.host.navigate(&url)?;
        self.return_urls.clear();
        Ok(())
    }

    fn post_to_host(&self, environment: &Environment, payload: &AuthPayload) -> Option<Delivery> {
        let (channel, target) = if environment.is_popup && self.host.opener_alive() {
            (Channel::Opener, MessageTarget::Opener)
        } else if environment.is_embedded_frame {
            (Channel::Parent, MessageTarget::Parent)
        } else {
            debug!(context = ?environment.context(), "no host channel; result stays in page");
            return None;
        };

        let outcome = payload
            .to_value()
            .and_then(|message| self.host.post_message(target, &message, self.origins.target_origin()));
        let accepted = self.log_outcome(channel, payload, outcome);

        // errors keep the popup open for a retry
        if channel == Channel::Opener && payload.is_success() && !self.host.is_closed() {
            if let Err(err) = self.host.close() {
                warn!(error = %err, "failed to close popup");
            }
        }

        Some(Delivery { channel, accepted })
    }

    fn log_outcome(&self, channel: Channel, payload: &AuthPayload, outcome: Result<()>) -> bool {
        match outcome {
            Ok(()) => {
                info!(%channel, kind = payload.type_name(), "auth result delivered");
                true
            }
            Err(err) => {
                warn!(%channel, error = %err, "auth result delivery failed");
                false
            }
        }
    }
}
