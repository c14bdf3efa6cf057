// SPDX-License-Identifier: GPL-3.0-or-later
use colorous::Gradient;
use serde::de::{self, Deserialize, Deserializer};

/// Map a gradient name to the colorous gradient of the same name.
///
/// Names are case-insensitive, and spaces can be used instead of underscores.
macro_rules! gradient_names {
    ($name:expr, [$($gradient:ident),+ $(,)?]) => {
        match $name {
            $(stringify!($gradient) => Ok(colorous::$gradient),)+
            _ => Err("Invalid gradient name"),
        }
    };
}

pub fn from_str(gradient_name: &str) -> Result<Gradient, &'static str> {
    let normalized = gradient_name.to_uppercase().replace(" ", "_");
    gradient_names!(
        normalized.as_str(),
        [
            BLUES,
            BLUE_GREEN,
            BLUE_PURPLE,
            BROWN_GREEN,
            CIVIDIS,
            COOL,
            CUBEHELIX,
            GREENS,
            GREEN_BLUE,
            GREYS,
            INFERNO,
            MAGMA,
            ORANGES,
            ORANGE_RED,
            PINK_GREEN,
            PLASMA,
            PURPLES,
            PURPLE_BLUE,
            PURPLE_BLUE_GREEN,
            PURPLE_GREEN,
            PURPLE_ORANGE,
            PURPLE_RED,
            RAINBOW,
            REDS,
            RED_BLUE,
            RED_GREY,
            RED_PURPLE,
            RED_YELLOW_BLUE,
            RED_YELLOW_GREEN,
            SINEBOW,
            SPECTRAL,
            TURBO,
            VIRIDIS,
            WARM,
            YELLOW_GREEN,
            YELLOW_GREEN_BLUE,
            YELLOW_ORANGE_BROWN,
            YELLOW_ORANGE_RED,
        ]
    )
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Gradient, D::Error>
where
    D: Deserializer<'de>,
{
    let gradient_name = String::deserialize(deserializer)?;
    from_str(&gradient_name).map_err(|_| {
        de::Error::invalid_value(
            de::Unexpected::Str(&gradient_name),
            &"a name of a colorous gradient",
        )
    })
}
