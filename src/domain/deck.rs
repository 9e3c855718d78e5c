use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::domain::card::{Card, Rank, Suit, Visibility};
use crate::domain::CardId;

/// Размер колоды.
pub const DECK_SIZE: usize = 52;

/// Стандартная 52-карточная колода в порядке:
/// Hearts A..K, Diamonds A..K, Clubs A..K, Spades A..K.
/// id здесь — индекс в этом порядке; сессия перенумеровывает карты при подготовке колоды.
pub fn standard_52() -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            cards.push(Card::new(cards.len() as CardId, rank, suit));
        }
    }
    cards
}

/// Стопка карт (колода или сброс).
///
/// Карты лежат по возрастанию `pile_order`: начало — самая "старая" карта,
/// конец — последняя положенная. Номера выдаются строго возрастающими.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pile {
    cards: VecDeque<Card>,
    next_order: u64,
}

impl Pile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// Последняя положенная карта (верх сброса).
    pub fn top(&self) -> Option<&Card> {
        self.cards.back()
    }

    /// Положить карту наверх со следующим номером.
    pub fn push(&mut self, mut card: Card) {
        card.pile_order = Some(self.next_order);
        self.next_order += 1;
        self.cards.push_back(card);
    }

    /// Забрать карту с наименьшим номером (так тянем из колоды).
    pub fn take_lowest(&mut self) -> Option<Card> {
        self.cards.pop_front()
    }

    /// Забрать верхнюю карту (так тянем из сброса).
    pub fn take_top(&mut self) -> Option<Card> {
        self.cards.pop_back()
    }

    /// Забрать все карты, кроме верхней. Верхняя остаётся на месте со своим номером.
    pub fn take_all_but_top(&mut self) -> Vec<Card> {
        let keep = self.cards.pop_back();
        let rest: Vec<Card> = self.cards.drain(..).collect();
        if let Some(top) = keep {
            self.cards.push_back(top);
        }
        rest
    }

    /// Выложить последовательность в заданном порядке (первая получит наименьший номер).
    pub fn extend_in_order(&mut self, cards: impl IntoIterator<Item = Card>, visibility: Visibility) {
        for mut card in cards {
            card.visibility = visibility;
            self.push(card);
        }
    }

    /// Проверка монотонности номеров (для инвариантов).
    pub fn is_strictly_ordered(&self) -> bool {
        let mut prev: Option<u64> = None;
        for card in &self.cards {
            match (prev, card.pile_order) {
                (_, None) => return false,
                (Some(p), Some(o)) if o <= p => return false,
                (_, Some(o)) => prev = Some(o),
            }
        }
        true
    }

    pub(crate) fn find(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub(crate) fn find_mut(&mut self, id: CardId) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == id)
    }
}
