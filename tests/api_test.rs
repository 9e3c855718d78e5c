// tests/api_test.rs

mod common;

use std::sync::Arc;

use cambio_engine::{
    api::{
        handle_command, handle_query, parse_command, parse_query, ApiError, CommandEnvelope,
        CommandResponse, QueryResponse, SessionViewDto, TurnActionDto, TurnRecordDto,
    },
    domain::{standard_52, DrawSource, GamePhase, GameRules, PlayerId, PowerKind, Rank, SessionId},
    engine::{ActionOutcome, EngineError, SessionManager},
    infra::{BroadcastHub, DeterministicRng, InMemorySessionStore, SessionStore},
};

type Manager = SessionManager<InMemorySessionStore, DeterministicRng>;

//
// ---------- helpers ----------
//

struct Api {
    _runtime: tokio::runtime::Runtime,
    manager: Manager,
}

fn api() -> Api {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("tokio runtime");
    let manager = SessionManager::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(BroadcastHub::new()),
        DeterministicRng::from_seed(71),
        GameRules::standard(),
        runtime.handle().clone(),
    );
    Api {
        _runtime: runtime,
        manager,
    }
}

impl Api {
    /// Команда в виде JSON, как её прислал бы транспорт.
    fn send(&self, raw: &str) -> Result<CommandResponse, ApiError> {
        let envelope: CommandEnvelope = parse_command(raw)?;
        handle_command(&self.manager, envelope)
    }

    fn session_cmd(
        &self,
        actor: PlayerId,
        session_id: SessionId,
        command: &str,
    ) -> Result<CommandResponse, ApiError> {
        self.send(&format!(
            r#"{{ "actor": {actor}, "command": {{ "type": "session_command", "session_id": {session_id}, "command": {command} }} }}"#
        ))
    }

    fn query(&self, viewer: Option<PlayerId>, raw: &str) -> Result<QueryResponse, ApiError> {
        handle_query(&self.manager, viewer, parse_query(raw)?)
    }

    /// Человек + бот, человек посмотрел карты: фаза playing.
    fn start_game(&self) -> (SessionId, PlayerId, PlayerId) {
        let created = self
            .send(
                r#"{ "command": { "type": "create_session", "player_count": 2, "bot_count": 1, "display_name": "Alice" } }"#,
            )
            .expect("create_session");
        let (session_id, player_id, view) = match created {
            CommandResponse::SessionCreated {
                session_id,
                player_id,
                session,
            } => (session_id, player_id, session),
            other => panic!("неожиданный ответ {other:?}"),
        };
        assert_eq!(view.phase, GamePhase::InitialView);
        let bot = view.players[1].player_id;

        self.session_cmd(player_id, session_id, r#"{ "action": "view_initial_cards" }"#)
            .expect("view_initial_cards");
        (session_id, player_id, bot)
    }

    /// Ход: взять из колоды, сбросить, отказаться от способности.
    fn plain_turn(&self, actor: PlayerId, session_id: SessionId) {
        self.session_cmd(actor, session_id, r#"{ "action": "draw", "source": "deck" }"#)
            .expect("draw");
        let resp = self
            .session_cmd(actor, session_id, r#"{ "action": "discard" }"#)
            .expect("discard");
        if let CommandResponse::ActionApplied {
            outcome: ActionOutcome::Discarded {
                power_window: Some(_),
                ..
            },
            ..
        } = resp
        {
            self.session_cmd(actor, session_id, r#"{ "action": "skip_power" }"#)
                .expect("skip_power");
        }
    }

    fn turn_log(&self, viewer: Option<PlayerId>, session_id: SessionId) -> Vec<TurnRecordDto> {
        match self
            .query(
                viewer,
                &format!(r#"{{ "type": "get_turn_log", "session_id": {session_id} }}"#),
            )
            .expect("get_turn_log")
        {
            QueryResponse::TurnLog(log) => log,
            other => panic!("неожиданный ответ {other:?}"),
        }
    }

    /// Следующая карта колоды будет нужного ранга.
    fn rig_next_deck_card(&self, session_id: SessionId, rank: Rank) {
        self.manager
            .store()
            .transact(session_id, 0, |tx| {
                common::rig_next_deck_card(&mut tx.session, rank);
                Ok(())
            })
            .expect("подтасовка колоды");
    }

    fn view(&self, viewer: Option<PlayerId>, session_id: SessionId) -> SessionViewDto {
        match self
            .query(
                viewer,
                &format!(r#"{{ "type": "get_session", "session_id": {session_id} }}"#),
            )
            .expect("get_session")
        {
            QueryResponse::Session(view) => view,
            other => panic!("неожиданный ответ {other:?}"),
        }
    }
}

//
// ---------- ошибки и статусы ----------
//

#[test]
fn engine_errors_map_to_http_statuses() {
    let cases = [
        (EngineError::SessionNotFound(1), 404),
        (EngineError::PlayerNotFound(1), 404),
        (EngineError::CardNotFound("gone"), 404),
        (EngineError::InvalidRequest("bad".to_string()), 400),
        (EngineError::InvalidTarget("self"), 400),
        (EngineError::NotYourTurn(1), 409),
        (EngineError::InvalidPhase { found: GamePhase::Setup }, 409),
        (EngineError::InsufficientCards, 409),
        (EngineError::AlreadyActed("twice"), 409),
        (EngineError::ConflictState("state"), 409),
        (EngineError::SessionFull, 409),
        (EngineError::PowerWindowClosed, 409),
        (
            EngineError::PowerMismatch {
                expected: PowerKind::PeekOwn,
                requested: PowerKind::BlindSwap,
            },
            409,
        ),
        (EngineError::MustSwapDiscardDraw, 409),
        (EngineError::Internal("boom"), 500),
    ];

    for (err, status) in cases {
        let text = err.to_string();
        let api: ApiError = err.into();
        assert_eq!(api.status_code(), status, "{text}");
        assert!(api.to_string().contains(&text), "сообщение движка сохраняется");
    }
    assert_eq!(ApiError::Unauthorized.status_code(), 401);
}

#[test]
fn malformed_json_is_bad_request() {
    let a = api();
    let err = a.send("{ not json").expect_err("битый JSON");
    assert_eq!(err.status_code(), 400);

    let err = a
        .send(r#"{ "command": { "type": "fly_to_moon" } }"#)
        .expect_err("неизвестная команда");
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[test]
fn session_command_without_actor_is_unauthorized() {
    let a = api();
    let (session_id, _, _) = a.start_game();

    let err = a
        .send(&format!(
            r#"{{ "command": {{ "type": "session_command", "session_id": {session_id}, "command": {{ "action": "call_cambio" }} }} }}"#
        ))
        .expect_err("нет actor");
    assert_eq!(err, ApiError::Unauthorized);
    assert_eq!(err.status_code(), 401);
}

#[test]
fn unknown_session_is_not_found() {
    let a = api();
    let err = a
        .session_cmd(1, 4242, r#"{ "action": "draw", "source": "deck" }"#)
        .expect_err("нет такой сессии");
    assert_eq!(err.status_code(), 404);

    let err = a
        .query(None, r#"{ "type": "get_session", "session_id": 4242 }"#)
        .expect_err("нет такой сессии");
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn out_of_turn_and_early_scores_are_conflicts() {
    let a = api();
    let (session_id, _, bot) = a.start_game();

    let err = a
        .session_cmd(bot, session_id, r#"{ "action": "draw", "source": "deck" }"#)
        .expect_err("не его ход");
    assert_eq!(err.status_code(), 409);

    let err = a
        .query(
            None,
            &format!(r#"{{ "type": "get_scores", "session_id": {session_id} }}"#),
        )
        .expect_err("раунд не завершён");
    assert_eq!(err.status_code(), 409);
}

#[test]
fn bad_target_is_bad_request() {
    let a = api();
    let (session_id, human, _) = a.start_game();
    a.session_cmd(human, session_id, r#"{ "action": "draw", "source": "deck" }"#)
        .expect("draw");

    let err = a
        .session_cmd(human, session_id, r#"{ "action": "swap", "index": 9 }"#)
        .expect_err("слота 9 нет");
    assert_eq!(err.status_code(), 400);
}

//
// ---------- полный раунд через JSON ----------
//

#[test]
fn full_round_over_json_commands() {
    let a = api();
    let (session_id, human, bot) = a.start_game();

    a.plain_turn(human, session_id);
    a.plain_turn(bot, session_id);

    let resp = a
        .session_cmd(human, session_id, r#"{ "action": "call_cambio" }"#)
        .expect("call_cambio");
    match resp {
        CommandResponse::ActionApplied { outcome, session } => {
            assert_eq!(outcome, ActionOutcome::CambioCalled);
            assert_eq!(session.phase, GamePhase::FinalRound);
            assert_eq!(session.cambio_caller, Some(human));
            assert_eq!(session.current_turn, Some(bot));
        }
        other => panic!("неожиданный ответ {other:?}"),
    }

    a.plain_turn(bot, session_id);

    let view = a.view(None, session_id);
    assert_eq!(view.phase, GamePhase::Completed);
    assert!(view
        .players
        .iter()
        .flat_map(|p| p.hand.iter())
        .all(|c| c.face.is_some()), "после завершения все карты открыты");

    let scores = match a
        .query(
            Some(human),
            &format!(r#"{{ "type": "get_scores", "session_id": {session_id} }}"#),
        )
        .expect("get_scores")
    {
        QueryResponse::Scores(scores) => scores,
        other => panic!("неожиданный ответ {other:?}"),
    };
    assert_eq!(scores.scores.len(), 2);
    assert_eq!(scores.winner_id, scores.winners.first().copied());
    assert_eq!(view.winner_id, scores.winner_id);

    let log = a.turn_log(None, session_id);
    assert!(log.iter().any(|r| r.action == TurnActionDto::Cambio && r.player_id == human));
    assert!(log.iter().enumerate().all(|(i, r)| r.index as usize == i));

    // После завершения любые ходы — конфликт.
    let err = a
        .session_cmd(human, session_id, r#"{ "action": "draw", "source": "deck" }"#)
        .expect_err("раунд окончен");
    assert_eq!(err.status_code(), 409);
}

#[test]
fn session_view_hides_faces_from_other_viewers() {
    let a = api();
    let (session_id, human, bot) = a.start_game();

    a.session_cmd(human, session_id, r#"{ "action": "draw", "source": "deck" }"#)
        .expect("draw");

    let own = a.view(Some(human), session_id);
    let me = &own.players[0];
    assert!(me.has_drawn_card);
    assert!(me.drawn_card.is_some(), "свою взятую карту игрок видит");
    assert!(me.hand.iter().all(|c| c.face.is_none()), "рука закрыта");
    assert!(own.discard_top.is_some(), "верх сброса виден всем");

    let other = a.view(Some(bot), session_id);
    assert!(other.players[0].has_drawn_card);
    assert!(other.players[0].drawn_card.is_none(), "чужая карта из колоды скрыта");

    let spectator = a.view(None, session_id);
    assert_eq!(spectator.viewer, None);
    assert!(spectator.players[0].drawn_card.is_none());
}

#[test]
fn hidden_cards_cannot_be_identified_by_id() {
    let a = api();
    let (session_id, human, bot) = a.start_game();
    let canonical = standard_52();

    // Чужие закрытые карты приходят без id, свои — с id.
    let view = a.view(Some(human), session_id);
    assert!(view.players[1].hand.iter().all(|c| c.card_id.is_none() && c.face.is_none()));
    assert!(view.players[0].hand.iter().all(|c| c.card_id.is_some()));

    // По своим id тоже нельзя восстановить лица через канонический порядок.
    let session = a.manager.session(session_id).expect("сессия");
    let guessed = session.players[0]
        .hand
        .iter()
        .filter(|c| canonical[c.id as usize].face() == c.face())
        .count();
    assert!(guessed < 4, "все 4 id совпали с каноническим порядком");

    // Ход человека: обмен вслепую с ботом.
    a.rig_next_deck_card(session_id, Rank::Jack);
    a.session_cmd(human, session_id, r#"{ "action": "draw", "source": "deck" }"#)
        .expect("draw");
    a.session_cmd(human, session_id, r#"{ "action": "discard" }"#)
        .expect("discard");
    a.session_cmd(
        human,
        session_id,
        &format!(
            r#"{{ "action": "activate_power", "power_type": "blind_swap", "my_index": 0, "target_player": {bot}, "target_index": 1 }}"#
        ),
    )
    .expect("blind_swap");

    // Ход бота: из колоды в слот 2.
    a.session_cmd(bot, session_id, r#"{ "action": "draw", "source": "deck" }"#)
        .expect("bot draw");
    a.session_cmd(bot, session_id, r#"{ "action": "swap", "index": 2 }"#)
        .expect("bot swap");

    let human_log = a.turn_log(Some(human), session_id);
    let bot_log = a.turn_log(Some(bot), session_id);
    let spectator_log = a.turn_log(None, session_id);
    assert_eq!(human_log.len(), bot_log.len());

    for (mine, theirs) in human_log.iter().zip(&spectator_log) {
        match (&mine.action, &theirs.action) {
            (TurnActionDto::Draw { source, card_id }, TurnActionDto::Draw { card_id: seen, .. }) => {
                if mine.player_id == human {
                    assert!(card_id.is_some(), "свою взятую карту игрок видит");
                }
                if *source == DrawSource::Deck {
                    assert_eq!(*seen, None, "зритель не видит id карты из колоды");
                }
            }
            (
                TurnActionDto::Power { target_cards, .. },
                TurnActionDto::Power { target_cards: seen, .. },
            ) => {
                assert_eq!(target_cards.len(), 2, "инициатор обмена видит обе карты");
                assert!(seen.is_empty());
            }
            (TurnActionDto::Swap { new_card_id, .. }, TurnActionDto::Swap { new_card_id: seen, .. }) => {
                assert_eq!(mine.player_id, bot);
                assert_eq!(*new_card_id, None, "человек не видит id карты бота");
                assert_eq!(*seen, None);
            }
            _ => assert_eq!(mine.action, theirs.action),
        }
    }

    // Бот видит свои записи целиком, но не цели чужого обмена.
    assert!(bot_log.iter().any(|r| matches!(
        r.action,
        TurnActionDto::Swap { new_card_id: Some(_), .. }
    )));
    assert!(bot_log
        .iter()
        .all(|r| !matches!(&r.action, TurnActionDto::Power { target_cards, .. } if !target_cards.is_empty())));

    // После обмена у каждого по-прежнему видны только свои id.
    let view = a.view(Some(bot), session_id);
    assert!(view.players[0].hand.iter().all(|c| c.card_id.is_none()));
    assert!(view.players[1].hand.iter().all(|c| c.card_id.is_some()));
}

#[test]
fn out_of_range_rules_are_bad_request() {
    let a = api();
    let bodies = [
        r#"{ "min_players": 1 }"#,
        r#"{ "max_players": 13 }"#,
        r#"{ "peek_duration_ms": 18446744073709551615 }"#,
        r#"{ "cambio_penalty_multiplier": 0 }"#,
    ];
    for rules in bodies {
        let err = a
            .send(&format!(
                r#"{{ "command": {{ "type": "create_session", "player_count": 2, "bot_count": 1, "display_name": "Alice", "rules": {rules} }} }}"#
            ))
            .expect_err("правила вне границ");
        assert_eq!(err.status_code(), 400, "правила {rules}");
    }

    let ok = a.send(
        r#"{ "command": { "type": "create_session", "player_count": 2, "bot_count": 1, "display_name": "Alice", "rules": { "peek_duration_ms": 2000 } } }"#,
    );
    assert!(matches!(ok, Ok(CommandResponse::SessionCreated { .. })));
}

#[test]
fn join_and_connection_commands() {
    let a = api();
    let created = a
        .send(r#"{ "command": { "type": "create_session", "player_count": 3, "display_name": "Host" } }"#)
        .expect("create_session");
    let (session_id, host) = match created {
        CommandResponse::SessionCreated {
            session_id,
            player_id,
            session,
        } => {
            assert_eq!(session.phase, GamePhase::Setup);
            (session_id, player_id)
        }
        other => panic!("неожиданный ответ {other:?}"),
    };

    let err = a
        .send(&format!(
            r#"{{ "command": {{ "type": "join_session", "session_id": {session_id}, "display_name": "!!" }} }}"#
        ))
        .expect_err("плохое имя");
    assert_eq!(err.status_code(), 400);

    let joined = a
        .send(&format!(
            r#"{{ "command": {{ "type": "join_session", "session_id": {session_id}, "display_name": "Guest One" }} }}"#
        ))
        .expect("join");
    assert!(matches!(joined, CommandResponse::Joined { .. }));

    let resp = a
        .session_cmd(host, session_id, r#"{ "action": "set_connection", "connected": false }"#)
        .expect("set_connection");
    match resp {
        CommandResponse::ConnectionUpdated { session } => {
            assert!(!session.players[0].is_connected);
        }
        other => panic!("неожиданный ответ {other:?}"),
    }
}

#[test]
fn activate_power_command_parses_nested_request() {
    let envelope = parse_command(
        r#"{ "actor": 3, "command": { "type": "session_command", "session_id": 1,
              "command": { "action": "activate_power", "power_type": "peek_opponent", "target_player": 2, "index": 1 } } }"#,
    )
    .expect("валидная команда");
    assert_eq!(envelope.actor, Some(3));

    let round_trip = serde_json::to_string(&envelope).expect("сериализация");
    assert_eq!(parse_command(&round_trip).expect("разбор"), envelope);
}
