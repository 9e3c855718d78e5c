use core::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{CardId, PlayerId};

/// Масть карты.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Suit {
    Hearts,   // ♥
    Diamonds, // ♦
    Clubs,    // ♣
    Spades,   // ♠
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];
}

/// Ранг карты. Туз младший (1 очко), король — 0 очков.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum Rank {
    Ace = 1,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Очки карты: A=1, 2–10 по номиналу, J/Q=10, K=0.
    pub const fn point_value(self) -> u32 {
        match self {
            Rank::Ace => 1,
            Rank::Jack | Rank::Queen => 10,
            Rank::King => 0,
            r => r as u32,
        }
    }

    /// Спец-способность, которую даёт ранг (None — у карты нет способности).
    pub const fn power(self) -> Option<PowerKind> {
        match self {
            Rank::Seven | Rank::Eight => Some(PowerKind::PeekOwn),
            Rank::Nine | Rank::Ten => Some(PowerKind::PeekOpponent),
            Rank::Jack | Rank::Queen => Some(PowerKind::BlindSwap),
            Rank::King => Some(PowerKind::LookOwn),
            _ => None,
        }
    }
}

/// Тип спец-способности.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PowerKind {
    /// Подсмотреть свою карту (7/8).
    PeekOwn,
    /// Подсмотреть карту соперника (9/10).
    PeekOpponent,
    /// Вслепую обменяться картой с соперником (J/Q).
    BlindSwap,
    /// Сервер случайно открывает одну из своих карт (K).
    LookOwn,
}

impl fmt::Display for PowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PowerKind::PeekOwn => "peek_own",
            PowerKind::PeekOpponent => "peek_opponent",
            PowerKind::BlindSwap => "blind_swap",
            PowerKind::LookOwn => "look_own",
        };
        f.write_str(s)
    }
}

/// Кто видит лицо карты.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Hidden,
    Visible,
    /// Временно открыта одному игроку (спец-способность).
    Peeking,
}

/// Позиция в сетке 2×2. Слот = row * 2 + col.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GridPosition {
    pub row: u8,
    pub col: u8,
}

impl GridPosition {
    pub const fn from_slot(slot: usize) -> Self {
        Self {
            row: (slot / 2) as u8,
            col: (slot % 2) as u8,
        }
    }

    pub const fn slot(self) -> usize {
        self.row as usize * 2 + self.col as usize
    }

    /// Нижний ряд — карты, которые игрок смотрит в начале партии.
    pub const fn is_initial_view_row(self) -> bool {
        self.row == 1
    }
}

/// Публичная "личность" карты: то, что раскрывается при подсмотре / в итогах.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CardFace {
    pub rank: Rank,
    pub suit: Suit,
    pub point_value: u32,
}

/// Физическая карта сессии. Живёт ровно в одном контейнере
/// (колода, сброс, рука, слот взятой карты) — см. `Session::card_location`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub rank: Rank,
    pub suit: Suit,
    pub visibility: Visibility,
    /// Порядок в стопке (только для колоды/сброса).
    pub pile_order: Option<u64>,
    /// Растёт при каждой смене контейнера или владельца.
    pub version: u32,
}

impl Card {
    pub const fn new(id: CardId, rank: Rank, suit: Suit) -> Self {
        Self {
            id,
            rank,
            suit,
            visibility: Visibility::Hidden,
            pile_order: None,
            version: 0,
        }
    }

    pub const fn point_value(&self) -> u32 {
        self.rank.point_value()
    }

    pub const fn face(&self) -> CardFace {
        CardFace {
            rank: self.rank,
            suit: self.suit,
            point_value: self.rank.point_value(),
        }
    }

    /// Отметить перемещение: новая версия, позиция в стопке сбрасывается.
    pub(crate) fn relocated(mut self, visibility: Visibility) -> Self {
        self.version = self.version.wrapping_add(1);
        self.pile_order = None;
        self.visibility = visibility;
        self
    }
}

/// Где сейчас находится карта (производное представление).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "location", rename_all = "snake_case")]
pub enum CardLocation {
    Deck { order: u64 },
    Discard { order: u64 },
    Hand { owner: PlayerId, position: GridPosition },
    Drawn { owner: PlayerId },
}

impl CardLocation {
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            CardLocation::Hand { owner, .. } | CardLocation::Drawn { owner } => Some(*owner),
            CardLocation::Deck { .. } | CardLocation::Discard { .. } => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ch = match self {
            Suit::Clubs => 'c',
            Suit::Diamonds => 'd',
            Suit::Hearts => 'h',
            Suit::Spades => 's',
        };
        write!(f, "{ch}")
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ch = match self {
            Rank::Ace => 'A',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            r => char::from_digit(*r as u32, 10).unwrap_or('?'),
        };
        write!(f, "{ch}")
    }
}

impl fmt::Display for CardFace {
    /// Формат вида `Ah`, `Td`, `7c`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}
