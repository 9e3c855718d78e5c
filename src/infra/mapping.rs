use crate::api::dto::{
    HandCardDto, PlayerViewDto, PowerWindowDto, ScoresDto, SessionViewDto, TurnActionDto,
    TurnRecordDto,
};
use crate::domain::{
    DrawSource, GridPosition, Player, PlayerId, RoundResult, Session, Visibility,
};
use crate::engine::{TurnAction, TurnRecord};

/// Маппинг Session -> SessionViewDto для конкретного зрителя.
///
/// Зритель видит лица только открытых карт, верх сброса и свою взятую карту.
/// Подсмотренные карты сюда не попадают: их лица уходят приватными событиями.
/// id закрытых чужих карт не отдаются.
pub fn map_session_to_dto(session: &Session, viewer: Option<PlayerId>) -> SessionViewDto {
    SessionViewDto {
        session_id: session.id,
        phase: session.phase,
        seats: session.seats,
        viewer,
        current_turn: session.current_turn,
        cambio_caller: session.cambio_caller,
        winner_id: session.winner_id,
        power_window: session.power_window.map(|w| PowerWindowDto {
            player_id: w.player_id,
            power: w.power,
        }),
        deck_size: session.draw_pile.len(),
        discard_size: session.discard_pile.len(),
        discard_top: session.discard_pile.top().map(|c| c.face()),
        players: session
            .players
            .iter()
            .map(|p| map_player_to_dto(p, viewer))
            .collect(),
        created_at_ms: session.created_at_ms,
        updated_at_ms: session.updated_at_ms,
        completed_at_ms: session.completed_at_ms,
    }
}

fn map_player_to_dto(player: &Player, viewer: Option<PlayerId>) -> PlayerViewDto {
    let is_owner = viewer == Some(player.id);
    let hand = player
        .hand
        .iter()
        .enumerate()
        .map(|(slot, card)| {
            let visible = card.visibility == Visibility::Visible;
            HandCardDto {
                card_id: (is_owner || visible).then_some(card.id),
                position: GridPosition::from_slot(slot),
                visibility: card.visibility,
                face: visible.then(|| card.face()),
            }
        })
        .collect();

    let drawn_card = player.drawn.and_then(|d| {
        let shown = is_owner || d.source == DrawSource::Discard;
        shown.then(|| d.card.face())
    });

    PlayerViewDto {
        player_id: player.id,
        display_name: player.display_name.clone(),
        kind: player.kind,
        turn_order: player.turn_order,
        is_connected: player.is_connected,
        has_viewed_initial_cards: player.has_viewed_initial_cards,
        has_taken_final_turn: player.has_taken_final_turn,
        hand,
        has_drawn_card: player.drawn.is_some(),
        drawn_card,
    }
}

/// Маппинг RoundResult -> ScoresDto.
pub fn map_scores_to_dto(result: &RoundResult) -> ScoresDto {
    ScoresDto {
        session_id: result.session_id,
        winner_id: result.canonical_winner(),
        winners: result.winners.clone(),
        min_base_score: result.min_base_score,
        scores: result.scores.clone(),
    }
}

/// Журнал ходов для зрителя: свои записи целиком, в чужих id закрытых карт скрыты.
pub fn map_turn_log_to_dto(records: &[TurnRecord], viewer: Option<PlayerId>) -> Vec<TurnRecordDto> {
    records
        .iter()
        .map(|r| TurnRecordDto {
            index: r.index,
            player_id: r.player_id,
            action: map_turn_action(&r.action, viewer == Some(r.player_id)),
            created_at_ms: r.created_at_ms,
        })
        .collect()
}

fn map_turn_action(action: &TurnAction, is_actor: bool) -> TurnActionDto {
    match *action {
        TurnAction::Draw { source, card_id } => TurnActionDto::Draw {
            source,
            card_id: (is_actor || source == DrawSource::Discard).then_some(card_id),
        },
        // Ушедшая в сброс карта лежит лицом вверх.
        TurnAction::Swap {
            position,
            old_card_id,
            new_card_id,
        } => TurnActionDto::Swap {
            position,
            old_card_id,
            new_card_id: is_actor.then_some(new_card_id),
        },
        TurnAction::Discard { card_id } => TurnActionDto::Discard { card_id },
        TurnAction::Power {
            power,
            target_player,
            ref target_cards,
        } => TurnActionDto::Power {
            power,
            target_player,
            target_cards: if is_actor {
                target_cards.clone()
            } else {
                Vec::new()
            },
        },
        TurnAction::Cambio => TurnActionDto::Cambio,
    }
}
