//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use runwire_client::{
    ClientMessage, ConnectionState, Phase, RenderIntent, ServerMessage, SessionEvent,
    TransportEvent,
};

use super::{Invariant, InvariantResult, SessionTrace, Step};
use crate::sim_driver::Effect;

/// Decoded backend message carried by a step, if any.
fn inbound(step: &Step) -> Option<Result<ServerMessage, ()>> {
    match &step.event {
        SessionEvent::Transport(TransportEvent::Message(raw)) => {
            Some(ServerMessage::decode(raw).map_err(|_| ()))
        },
        _ => None,
    }
}

fn runs(step: &Step) -> Vec<(usize, &str)> {
    step.effects
        .iter()
        .enumerate()
        .filter_map(|(i, effect)| match effect {
            Effect::Send(ClientMessage::Run { source }) => Some((i, source.as_str())),
            _ => None,
        })
        .collect()
}

fn closes(step: &Step) -> usize {
    step.effects.iter().filter(|e| **e == Effect::Send(ClientMessage::Close)).count()
}

/// Only the backend and the loss of the connection move the phase.
///
/// `started` sets `Running`; `stopped`, `error` and a transport close set
/// `Idle`. Every other event leaves the phase alone.
pub struct PhaseFollowsBackend;

impl Invariant for PhaseFollowsBackend {
    fn name(&self) -> &'static str {
        "PhaseFollowsBackend"
    }

    fn check(&self, trace: &SessionTrace) -> InvariantResult {
        for (index, step) in trace.steps().iter().enumerate() {
            let unchanged = step.before.phase;
            let expected = if step.before.torn_down {
                unchanged
            } else {
                match (&step.event, inbound(step)) {
                    (_, Some(Ok(ServerMessage::Started))) => Phase::Running,
                    (_, Some(Ok(ServerMessage::Stopped | ServerMessage::Error { .. })))
                    | (SessionEvent::Transport(TransportEvent::Closed), _) => Phase::Idle,
                    _ => unchanged,
                }
            };

            if step.after.phase != expected {
                return Err(self.violation(
                    index,
                    format!(
                        "{:?} moved phase {:?} → {:?}, expected {:?}",
                        step.event, step.before.phase, step.after.phase, expected
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// `run` is sent exactly for accepted submits.
///
/// A submit is accepted when the source is non-empty, the session is idle and
/// the connection is open. An accepted submit sends the exact text once,
/// preceded by exactly one clear. Nothing else ever sends `run`.
pub struct RunRequiresIdleOpen;

impl Invariant for RunRequiresIdleOpen {
    fn name(&self) -> &'static str {
        "RunRequiresIdleOpen"
    }

    fn check(&self, trace: &SessionTrace) -> InvariantResult {
        for (index, step) in trace.steps().iter().enumerate() {
            let sent = runs(step);
            let before = &step.before;
            let submitted = match &step.event {
                SessionEvent::Submit { source } => Some(source.as_str()),
                _ => None,
            };
            let acceptable = !before.torn_down
                && before.phase == Phase::Idle
                && before.connection == ConnectionState::Open
                && submitted.is_some_and(|s| !s.is_empty());

            match (acceptable, sent.as_slice()) {
                (false, []) => {},
                (true, [(position, source)]) => {
                    if Some(*source) != submitted {
                        return Err(self.violation(index, format!("run carried {source:?}")));
                    }
                    let clears: Vec<_> = step
                        .effects
                        .iter()
                        .enumerate()
                        .filter(|(_, e)| **e == Effect::Render(RenderIntent::ClearOutput))
                        .map(|(i, _)| i)
                        .collect();
                    if clears.len() != 1 || clears[0] > *position {
                        return Err(self.violation(
                            index,
                            format!("run at {position} with clears at {clears:?}"),
                        ));
                    }
                },
                (true, _) => {
                    return Err(self.violation(
                        index,
                        format!("accepted submit sent {} run messages", sent.len()),
                    ));
                },
                (false, _) => {
                    return Err(self.violation(
                        index,
                        format!("{:?} in {before:?} sent run", step.event),
                    ));
                },
            }
        }
        Ok(())
    }
}

/// Output chunks render unchanged, tagged with their stream, one per message.
///
/// Messages that carry no output never render.
pub struct OutputMirrorsMessages;

impl Invariant for OutputMirrorsMessages {
    fn name(&self) -> &'static str {
        "OutputMirrorsMessages"
    }

    fn check(&self, trace: &SessionTrace) -> InvariantResult {
        for (index, step) in trace.steps().iter().enumerate() {
            if step.before.torn_down {
                continue;
            }

            let expected = match inbound(step) {
                Some(Ok(ServerMessage::Output { stream, text })) => {
                    vec![Effect::Render(RenderIntent::AppendLine { stream, text })]
                },
                Some(Ok(ServerMessage::Error { diagnostic })) => {
                    vec![Effect::Render(RenderIntent::stderr(diagnostic))]
                },
                Some(_) => Vec::new(),
                None => continue,
            };

            if step.effects != expected {
                return Err(self.violation(
                    index,
                    format!("expected {expected:?}, got {:?}", step.effects),
                ));
            }
        }
        Ok(())
    }
}

/// `close` is sent at most once, and only when tearing down an open session.
pub struct CloseOnlyOnOpenTeardown;

impl Invariant for CloseOnlyOnOpenTeardown {
    fn name(&self) -> &'static str {
        "CloseOnlyOnOpenTeardown"
    }

    fn check(&self, trace: &SessionTrace) -> InvariantResult {
        for (index, step) in trace.steps().iter().enumerate() {
            let tearing_down_open = step.event == SessionEvent::Unload
                && !step.before.torn_down
                && step.before.connection == ConnectionState::Open;
            let expected = usize::from(tearing_down_open);
            let actual = closes(step);

            if actual != expected {
                return Err(self.violation(
                    index,
                    format!("{:?} in {:?} sent {actual} close messages", step.event, step.before),
                ));
            }
        }
        Ok(())
    }
}

/// Teardown ends with a stop, after which nothing happens.
pub struct InertAfterTeardown;

impl Invariant for InertAfterTeardown {
    fn name(&self) -> &'static str {
        "InertAfterTeardown"
    }

    fn check(&self, trace: &SessionTrace) -> InvariantResult {
        for (index, step) in trace.steps().iter().enumerate() {
            if step.before.torn_down {
                if !step.effects.is_empty() || step.after != step.before {
                    return Err(self.violation(
                        index,
                        format!("{:?} after teardown had effects {:?}", step.event, step.effects),
                    ));
                }
            } else if step.event == SessionEvent::Unload
                && (!step.after.torn_down || step.effects.last() != Some(&Effect::Stop))
            {
                return Err(self.violation(index, "teardown did not end with stop".to_string()));
            }
        }
        Ok(())
    }
}
