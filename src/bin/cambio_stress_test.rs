use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use rand::Rng;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cambio_engine::domain::{
    DrawSource, GamePhase, GameRules, PlayerId, PlayerKind, PowerKind, SessionId,
};
use cambio_engine::engine::session_manager::CreateSessionRequest;
use cambio_engine::engine::{ActionOutcome, EngineError, PowerRequest, SessionManager};
use cambio_engine::infra::{BroadcastHub, InMemorySessionStore, SystemRng};

type Manager = SessionManager<InMemorySessionStore, SystemRng>;

// Параметры нагрузки.
const NUM_THREADS: usize = 8;
const SESSIONS_PER_THREAD: usize = 64;
const MAX_STEPS: u32 = 400;

/// Общая статистика прогона.
#[derive(Default)]
struct Stats {
    completed: AtomicU64,
    stuck: AtomicU64,
    actions: AtomicU64,
    rejected_out_of_turn: AtomicU64,
    invariant_failures: AtomicU64,
    errors: AtomicU64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("cambio_stress_test: стартуем стресс-тест движка Cambio");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "не удалось поднять tokio runtime");
            return;
        }
    };

    let manager: Arc<Manager> = Arc::new(SessionManager::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(BroadcastHub::new()),
        SystemRng,
        GameRules {
            peek_duration_ms: 50,
            ..GameRules::standard()
        },
        runtime.handle().clone(),
    ));
    let stats = Arc::new(Stats::default());

    thread::scope(|scope| {
        for worker in 0..NUM_THREADS {
            let manager = Arc::clone(&manager);
            let stats = Arc::clone(&stats);
            scope.spawn(move || {
                for n in 0..SESSIONS_PER_THREAD {
                    let player_count = 2 + ((worker + n) % 3) as u8;
                    if let Err(e) = play_session(&manager, &stats, player_count) {
                        stats.errors.fetch_add(1, Ordering::Relaxed);
                        warn!(worker, error = %e, "сессия оборвалась с ошибкой");
                    }
                }
            });
        }
    });

    info!("=========== STRESS TEST SUMMARY ===========");
    info!(sessions = NUM_THREADS * SESSIONS_PER_THREAD, "всего сессий");
    info!(completed = stats.completed.load(Ordering::Relaxed), "завершено раундов");
    info!(stuck = stats.stuck.load(Ordering::Relaxed), "упёрлись в лимит шагов");
    info!(actions = stats.actions.load(Ordering::Relaxed), "принято действий");
    info!(
        rejected = stats.rejected_out_of_turn.load(Ordering::Relaxed),
        "отклонено ходов вне очереди"
    );
    info!(
        invariant_failures = stats.invariant_failures.load(Ordering::Relaxed),
        errors = stats.errors.load(Ordering::Relaxed),
        "нарушения"
    );
    info!("===========================================");
}

/// Сыграть одну сессию ботовой логикой до завершения.
fn play_session(manager: &Manager, stats: &Stats, player_count: u8) -> Result<(), EngineError> {
    let mut rng = rand::thread_rng();

    let created = manager.create_session(CreateSessionRequest {
        player_count,
        bot_count: 0,
        creator_name: "Stress Host".to_string(),
        rules: None,
    })?;
    let session_id = created.session.id;

    let mut humans = vec![created.creator_id];
    for seat in 1..player_count {
        humans.push(manager.join(session_id, &format!("Stress {seat}"), PlayerKind::Human)?);
    }
    for &player_id in &humans {
        manager.view_initial_cards(session_id, player_id)?;
    }

    let mut pending_power: Option<PowerKind> = None;
    let mut turns_taken: u32 = 0;

    for _ in 0..MAX_STEPS {
        let session = manager.session(session_id)?;
        check_invariants(stats, session_id, &session);

        if session.phase == GamePhase::Completed {
            stats.completed.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        let current = session
            .current_turn
            .ok_or(EngineError::Internal("active session without current turn"))?;

        // Чужой ход должен отклоняться.
        if let Some(&intruder) = humans.iter().find(|&&p| p != current) {
            match manager.draw(session_id, intruder, DrawSource::Deck) {
                Err(EngineError::NotYourTurn(_)) => {
                    stats.rejected_out_of_turn.fetch_add(1, Ordering::Relaxed);
                }
                Err(_) => {}
                Ok(_) => {
                    error!(session_id, intruder, "ход вне очереди был принят");
                    stats.invariant_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        if let Some(power) = pending_power.take() {
            let request = pick_power_request(&mut rng, power, current, &humans);
            manager.activate_power(session_id, current, request)?;
            stats.actions.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        let has_drawn = session
            .player(current)
            .map(|p| p.drawn.is_some())
            .unwrap_or(false);

        let outcome = if has_drawn {
            if rng.gen_bool(0.6) {
                manager.swap(session_id, current, rng.gen_range(0..4))?
            } else {
                manager.discard(session_id, current)?
            }
        } else if session.phase == GamePhase::Playing
            && turns_taken > 6
            && rng.gen_bool(0.15)
        {
            manager.call_cambio(session_id, current)?
        } else {
            let source = if rng.gen_bool(0.3) {
                DrawSource::Discard
            } else {
                DrawSource::Deck
            };
            match manager.draw(session_id, current, source) {
                Err(EngineError::InsufficientCards) => {
                    manager.draw(session_id, current, DrawSource::Discard)?
                }
                other => other?,
            }
        };
        stats.actions.fetch_add(1, Ordering::Relaxed);

        match outcome {
            ActionOutcome::Swapped { power_window, .. }
            | ActionOutcome::Discarded { power_window, .. } => {
                pending_power = power_window;
                turns_taken += 1;
            }
            _ => {}
        }
    }

    stats.stuck.fetch_add(1, Ordering::Relaxed);
    warn!(session_id, "превышен лимит шагов ({MAX_STEPS})");
    Ok(())
}

fn check_invariants(stats: &Stats, session_id: SessionId, session: &cambio_engine::Session) {
    if let Some(violation) = session.invariant_violation() {
        stats.invariant_failures.fetch_add(1, Ordering::Relaxed);
        error!(session_id, violation, "нарушен инвариант сессии");
    }
}

/// Случайный корректный запрос под открытое окно.
fn pick_power_request(
    rng: &mut impl Rng,
    power: PowerKind,
    actor: PlayerId,
    players: &[PlayerId],
) -> PowerRequest {
    let opponents: Vec<PlayerId> = players.iter().copied().filter(|&p| p != actor).collect();
    let opponent = opponents[rng.gen_range(0..opponents.len())];

    match power {
        PowerKind::PeekOwn => PowerRequest::PeekOwn {
            index: rng.gen_range(0..4),
        },
        PowerKind::PeekOpponent => PowerRequest::PeekOpponent {
            target_player: opponent,
            index: rng.gen_range(0..4),
        },
        PowerKind::BlindSwap => PowerRequest::BlindSwap {
            my_index: rng.gen_range(0..4),
            target_player: opponent,
            target_index: rng.gen_range(0..4),
        },
        PowerKind::LookOwn => PowerRequest::LookOwn,
    }
}
