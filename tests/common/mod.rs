// tests/common/mod.rs
//
// Общие помощники для интеграционных тестов:
//  - сессия на уровне движка (без хранилища), действия через Transaction;
//  - подтасовка колоды и рук без нарушения инвариантов (52 карты, порядок стопок).

#![allow(dead_code)]

use cambio_engine::domain::{
    Card, CardId, DrawSource, GameRules, Pile, PlayerId, Rank, RoundResult, Session, Visibility,
};
use cambio_engine::engine::turn_engine::{self, ActionOutcome, NewSession};
use cambio_engine::engine::{
    EngineError, Outbox, PlayerAction, PlayerActionKind, Transaction, TurnRecord,
};
use cambio_engine::infra::DeterministicRng;

pub const NOW_MS: u64 = 1_700_000_000_000;

/// Сессия, прогоняемая напрямую через движок.
pub struct Game {
    pub session: Session,
    pub rng: DeterministicRng,
    /// Игроки в порядке хода; первый — человек-создатель, остальные боты.
    pub players: Vec<PlayerId>,
    pub turns: Vec<TurnRecord>,
    pub scores: Option<RoundResult>,
}

impl Game {
    /// Сессия в фазе initial_view (раздача уже прошла).
    pub fn dealt(player_count: u8, seed: u64) -> Self {
        Self::dealt_with_rules(player_count, seed, GameRules::standard())
    }

    pub fn dealt_with_rules(player_count: u8, seed: u64, rules: GameRules) -> Self {
        let mut rng = DeterministicRng::from_seed(seed);
        let players: Vec<PlayerId> = (1..=player_count as u64).collect();
        let mut outbox = Outbox::new();

        let session = turn_engine::create_session(
            NewSession {
                session_id: 1,
                player_count,
                creator_id: players[0],
                creator_name: "Creator".to_string(),
                bot_ids: players[1..].to_vec(),
                rules,
                now_ms: NOW_MS,
            },
            &mut rng,
            &mut outbox,
        )
        .expect("create_session должен пройти");

        Self {
            session,
            rng,
            players,
            turns: Vec::new(),
            scores: None,
        }
    }

    /// Сессия в фазе playing: создатель посмотрел свои карты, ходит он.
    pub fn playing(player_count: u8, seed: u64) -> Self {
        Self::playing_with_rules(player_count, seed, GameRules::standard())
    }

    pub fn playing_with_rules(player_count: u8, seed: u64, rules: GameRules) -> Self {
        let mut game = Self::dealt_with_rules(player_count, seed, rules);
        let creator = game.players[0];
        game.act(creator, PlayerActionKind::ViewInitialCards)
            .expect("просмотр начальных карт");
        game
    }

    pub fn current(&self) -> PlayerId {
        self.session.current_turn.expect("нет текущего игрока")
    }

    /// Одна транзакция: Ok — коммит, Err — состояние не меняется.
    pub fn act(
        &mut self,
        player_id: PlayerId,
        kind: PlayerActionKind,
    ) -> Result<(ActionOutcome, Outbox), EngineError> {
        let mut tx = Transaction::begin(
            self.session.clone(),
            self.turns.len(),
            self.scores.is_some(),
            NOW_MS,
        );
        let mut outbox = Outbox::new();
        let outcome = turn_engine::apply_action(
            &mut tx,
            &mut self.rng,
            PlayerAction { player_id, kind },
            &mut outbox,
        )?;
        let commit = tx.finish()?;

        self.turns.extend(commit.turns);
        if commit.scores.is_some() {
            self.scores = commit.scores;
        }
        self.session = commit.session;
        Ok((outcome, outbox))
    }

    /// Обычный ход текущего игрока: взять из колоды и сбросить.
    /// Если открылось окно способности — отказаться от неё.
    pub fn plain_turn(&mut self) {
        let player = self.current();
        self.act(
            player,
            PlayerActionKind::Draw {
                source: DrawSource::Deck,
            },
        )
        .expect("draw");
        let (outcome, _) = self.act(player, PlayerActionKind::Discard).expect("discard");
        if let ActionOutcome::Discarded {
            power_window: Some(_),
            ..
        } = outcome
        {
            self.act(player, PlayerActionKind::SkipPower).expect("skip power");
        }
    }

    pub fn rig_next_deck_card(&mut self, rank: Rank) -> CardId {
        rig_next_deck_card(&mut self.session, rank)
    }
}

/// Поставить карту нужного ранга первой в колоду.
pub fn rig_next_deck_card(session: &mut Session, rank: Rank) -> CardId {
    let mut cards: Vec<Card> = std::iter::from_fn(|| session.draw_pile.take_lowest()).collect();
    let pos = cards
        .iter()
        .position(|c| c.rank == rank)
        .expect("в колоде нет карты нужного ранга");
    let card = cards.remove(pos);
    cards.insert(0, card);

    session.draw_pile = Pile::new();
    session.draw_pile.extend_in_order(cards, Visibility::Hidden);
    card.id
}

/// Разложить игрокам руки заданных рангов. Прежние карты рук уходят в колоду.
pub fn rig_hands(session: &mut Session, hands: &[(PlayerId, [Rank; 4])]) {
    let mut pool: Vec<Card> = std::iter::from_fn(|| session.draw_pile.take_lowest()).collect();

    for (player_id, _) in hands {
        let player = session.player_mut(*player_id).expect("игрок");
        pool.extend(player.hand.drain(..));
    }

    for (player_id, ranks) in hands {
        for rank in ranks {
            let pos = pool
                .iter()
                .position(|c| c.rank == *rank)
                .expect("нет карты нужного ранга вне сброса");
            let mut card = pool.remove(pos);
            card.pile_order = None;
            card.visibility = Visibility::Hidden;
            session
                .player_mut(*player_id)
                .expect("игрок")
                .hand
                .push(card);
        }
    }

    session.draw_pile = Pile::new();
    session.draw_pile.extend_in_order(pool, Visibility::Hidden);
}

/// Кол-во карт в сессии + проверка инвариантов одним вызовом.
pub fn assert_session_ok(session: &Session) {
    assert_eq!(session.total_cards(), 52, "в сессии должно быть ровно 52 карты");
    assert_eq!(
        session.invariant_violation(),
        None,
        "инварианты сессии нарушены"
    );
}
