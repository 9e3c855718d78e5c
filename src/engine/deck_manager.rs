//! DeckManager: создание, перемешивание, раздача и пересборка колоды.
//!
//! Все функции работают с рабочей копией сессии внутри транзакции.

use crate::domain::{
    standard_52, Card, CardId, DrawSource, GamePhase, Pile, Session, Visibility, HAND_SIZE,
};
use crate::engine::errors::EngineError;
use crate::engine::RandomSource;

/// 52 канонические карты (масть, ранг, очки).
pub fn create_deck() -> Vec<Card> {
    standard_52()
}

/// Равномерная перестановка (Fisher–Yates внутри `RandomSource`).
pub fn shuffle<T, R: RandomSource>(rng: &mut R, cards: &mut [T]) {
    rng.shuffle(cards);
}

/// Положить в сессию новую перемешанную колоду. Только для пустой сессии.
///
/// id карт в сессии — отдельная случайная перестановка 0..52: по id
/// нельзя восстановить масть и ранг.
pub fn prepare_deck<R: RandomSource>(session: &mut Session, rng: &mut R) -> Result<(), EngineError> {
    if session.total_cards() != 0 {
        return Err(EngineError::Internal("deck already prepared"));
    }
    let mut cards = create_deck();
    shuffle(rng, &mut cards);
    renumber(rng, &mut cards);
    session.draw_pile.extend_in_order(cards, Visibility::Hidden);
    Ok(())
}

/// Раздача: по 4 карты каждому в порядке хода, следующая — в сброс лицом вверх,
/// остаток становится колодой с номерами от нуля.
pub fn deal(session: &mut Session) -> Result<(), EngineError> {
    if session.phase != GamePhase::Setup {
        return Err(EngineError::InvalidPhase {
            found: session.phase,
        });
    }
    if (session.players.len() as u8) < session.rules.min_players {
        return Err(EngineError::ConflictState("not enough players to deal"));
    }

    let needed = session.players.len() * HAND_SIZE + 1;
    if session.draw_pile.len() < needed {
        return Err(EngineError::InsufficientCards);
    }

    for player_idx in 0..session.players.len() {
        for _slot in 0..HAND_SIZE {
            let card = session
                .draw_pile
                .take_lowest()
                .ok_or(EngineError::Internal("deck ran out while dealing"))?;
            session.players[player_idx]
                .hand
                .push(card.relocated(Visibility::Hidden));
        }
    }

    let first_discard = session
        .draw_pile
        .take_lowest()
        .ok_or(EngineError::Internal("deck ran out while dealing"))?;
    session.discard_pile = Pile::new();
    session
        .discard_pile
        .push(first_discard.relocated(Visibility::Visible));

    let rest: Vec<Card> = std::iter::from_fn(|| session.draw_pile.take_lowest()).collect();
    session.draw_pile = Pile::new();
    session.draw_pile.extend_in_order(rest, Visibility::Hidden);

    Ok(())
}

/// Пересобрать сброс в колоду: всё, кроме верхней карты, перемешать и положить в колоду.
pub fn reshuffle_discard_into_deck<R: RandomSource>(
    session: &mut Session,
    rng: &mut R,
) -> Result<usize, EngineError> {
    if session.discard_pile.len() <= 1 {
        return Err(EngineError::InsufficientCards);
    }

    let mut cards: Vec<Card> = session
        .discard_pile
        .take_all_but_top()
        .into_iter()
        .map(|c| c.relocated(Visibility::Hidden))
        .collect();
    shuffle(rng, &mut cards);
    // Лица этих карт все видели в сбросе.
    renumber(rng, &mut cards);

    let moved = cards.len();
    session.draw_pile.extend_in_order(cards, Visibility::Hidden);
    Ok(moved)
}

/// Случайно переставить id между картами набора.
fn renumber<R: RandomSource>(rng: &mut R, cards: &mut [Card]) {
    let mut ids: Vec<CardId> = cards.iter().map(|c| c.id).collect();
    shuffle(rng, &mut ids);
    for (card, id) in cards.iter_mut().zip(ids) {
        card.id = id;
    }
}

/// Проверить, что из источника можно тянуть (без мутаций).
pub fn ensure_drawable(session: &Session, source: DrawSource) -> Result<(), EngineError> {
    match source {
        DrawSource::Deck => {
            if session.draw_pile.is_empty() && session.discard_pile.len() <= 1 {
                return Err(EngineError::InsufficientCards);
            }
        }
        DrawSource::Discard => {
            if session.discard_pile.is_empty() {
                return Err(EngineError::InsufficientCards);
            }
        }
    }
    Ok(())
}

/// Взять карту: из колоды — с наименьшим номером (при пустой колоде сначала
/// пересборка), из сброса — верхнюю.
pub fn draw_top<R: RandomSource>(
    session: &mut Session,
    rng: &mut R,
    source: DrawSource,
) -> Result<Card, EngineError> {
    ensure_drawable(session, source)?;

    match source {
        DrawSource::Deck => {
            if session.draw_pile.is_empty() {
                reshuffle_discard_into_deck(session, rng)?;
            }
            let card = session
                .draw_pile
                .take_lowest()
                .ok_or(EngineError::InsufficientCards)?;
            Ok(card.relocated(Visibility::Hidden))
        }
        DrawSource::Discard => {
            let card = session
                .discard_pile
                .take_top()
                .ok_or(EngineError::InsufficientCards)?;
            Ok(card.relocated(Visibility::Visible))
        }
    }
}

/// Положить карту наверх сброса лицом вверх.
pub fn place_on_discard(session: &mut Session, card: Card) {
    session.discard_pile.push(card.relocated(Visibility::Visible));
}
