use std::time::Duration;

use quiz_core::model::{ChoiceIndex, QuizOutcome};
use quiz_core::quiz::QuizPhase;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::debug;

use super::service::QuizSession;
use crate::events::{QuizEventSink, emit_all};

const TICK: Duration = Duration::from_secs(1);

/// Drive a started session to `Finished` on the current task.
///
/// Countdown ticks and incoming answers are interleaved one at a time, so the
/// engine only ever sees a single transition at once. After a question is
/// resolved the runner waits for the feedback delay, throws away answers typed
/// in the meantime, and moves on. If `answers` closes, the remaining questions
/// run out on the clock.
///
/// Returns the outcome, or `None` if the session was never started.
pub async fn run_quiz(
    session: &mut QuizSession,
    answers: &mut mpsc::Receiver<ChoiceIndex>,
    sink: &dyn QuizEventSink,
) -> Option<QuizOutcome> {
    let feedback_delay = session.engine().rules().feedback_delay();
    let mut answers_open = true;

    emit_all(sink, session.take_opening_events());

    loop {
        match session.engine().phase() {
            QuizPhase::Idle => return None,
            QuizPhase::Finished => return session.engine().outcome(),
            QuizPhase::AwaitingAnswer { index } => {
                debug!(index, "awaiting answer");
                let mut ticker = interval_at(Instant::now() + TICK, TICK);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                while session.engine().is_awaiting_answer() {
                    tokio::select! {
                        _ = ticker.tick() => {
                            emit_all(sink, session.engine_mut().tick());
                        }
                        answer = answers.recv(), if answers_open => match answer {
                            Some(choice) => emit_all(sink, session.engine_mut().submit_answer(choice)),
                            None => answers_open = false,
                        },
                    }
                }
            }
            QuizPhase::Resolved { .. } => {
                sleep(feedback_delay).await;
                while answers.try_recv().is_ok() {}
                emit_all(sink, session.engine_mut().advance());
            }
        }
    }
}
