use serde::{Deserialize, Serialize};

/// Rule flags consumed at reconstruction and scoring time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ruleset {
    pub num_players: u8,
    /// Whether red fives are retained at ingest or normalized away.
    pub use_red_fives: bool,
    /// Whether a kan reveals its new dora indicator immediately, or on the
    /// next discard.
    pub immediate_kan_dora: bool,
    /// Promote (4 han, 30 fu) and (3 han, 60 fu) to mangan.
    pub kiriage_mangan: bool,
    /// Dealer win in the final round ends the hanchan.
    pub agari_yame: bool,
    /// Dealer tenpai at a final-round draw ends the hanchan.
    pub tenpai_yame: bool,
    /// Dora indicators visible at round start, usually 1.
    pub starting_doras: u8,
    pub renhou_enabled: bool,

    pub kokushi_13_wait_double: bool,
    pub suuankou_tanki_double: bool,
    pub junsei_chuuren_double: bool,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::default_tenhou()
    }
}

impl Ruleset {
    pub fn default_tenhou() -> Self {
        Self {
            num_players: 4,
            use_red_fives: true,
            immediate_kan_dora: false,
            kiriage_mangan: false,
            agari_yame: true,
            tenpai_yame: true,
            starting_doras: 1,
            renhou_enabled: false,
            kokushi_13_wait_double: false,
            suuankou_tanki_double: false,
            junsei_chuuren_double: false,
        }
    }

    pub fn default_mjsoul() -> Self {
        Self {
            num_players: 4,
            use_red_fives: true,
            immediate_kan_dora: true,
            kiriage_mangan: true,
            agari_yame: true,
            tenpai_yame: true,
            starting_doras: 1,
            renhou_enabled: false,
            kokushi_13_wait_double: true,
            suuankou_tanki_double: true,
            junsei_chuuren_double: true,
        }
    }

    pub fn default_riichi_city() -> Self {
        Self {
            kiriage_mangan: true,
            renhou_enabled: true,
            ..Self::default_mjsoul()
        }
    }

    pub fn default_tenhou_sanma() -> Self {
        Self {
            num_players: 3,
            ..Self::default_tenhou()
        }
    }

    pub fn default_mjsoul_sanma() -> Self {
        Self {
            num_players: 3,
            ..Self::default_mjsoul()
        }
    }

    pub fn is_sanma(&self) -> bool {
        self.num_players == 3
    }
}
