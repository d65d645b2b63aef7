use std::{fmt, str::FromStr, sync::OnceLock};

use rand::Rng;

use super::{RuleError, HEALTH_DIE};

static DICE_REGEX: OnceLock<regex_lite::Regex> = OnceLock::new();

const MAX_DICE: u32 = 100;
const MAX_SIDES: u32 = 100;

/// A dice expression such as `2d6+1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceExpression {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl FromStr for DiceExpression {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = DICE_REGEX.get_or_init(|| {
            regex_lite::Regex::new(r"^(\d*)[dD](\d+)(?:\s*([+-])\s*(\d+))?$")
                .expect("DICE_REGEX pattern is invalid")
        });
        let invalid = || RuleError::InvalidDiceExpression(s.to_string());

        let caps = re.captures(s.trim()).ok_or_else(invalid)?;
        let count = match caps.get(1).map(|m| m.as_str()) {
            Some("") | None => 1,
            Some(n) => n.parse::<u32>().map_err(|_| invalid())?,
        };
        let sides = caps[2].parse::<u32>().map_err(|_| invalid())?;
        let modifier = match (caps.get(3), caps.get(4)) {
            (Some(sign), Some(value)) => {
                let value = value.as_str().parse::<i32>().map_err(|_| invalid())?;
                if sign.as_str() == "-" {
                    -value
                } else {
                    value
                }
            }
            _ => 0,
        };

        if !(1..=MAX_DICE).contains(&count) || !(2..=MAX_SIDES).contains(&sides) {
            return Err(invalid());
        }

        Ok(Self {
            count,
            sides,
            modifier,
        })
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{}", m),
            m => write!(f, "{}", m),
        }
    }
}

/// Roll the level-up health die
pub fn roll_health<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.random_range(1..=HEALTH_DIE)
}
