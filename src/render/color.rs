use color_space::Rgb;
use regex::bytes::Regex;

pub fn parse_color(color_str: &str) -> Result<Rgb, &'static str> {
    if color_str.starts_with("rgb") {
        let pattern = Regex::new(r"^rgb\((\d{1,3}),(\d{1,3}),(\d{1,3})\)$")
            .map_err(|_| "Invalid rgb color pattern")?;
        if !pattern.is_match(color_str.as_bytes()) {
            return Err(
                "Invalid background rgb color format, expected rgb(r,g,b) such as rgb(122,31,212)",
            );
        }

        let rgb = color_str[4..color_str.len() - 1]
            .split(',')
            .map(|s| s.parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| "Invalid background rgb color, channels must be within 0..=255")?;
        Ok(Rgb::new(rgb[0] as f64, rgb[1] as f64, rgb[2] as f64))
    } else if let Some(hex) = color_str.strip_prefix('#') {
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err("Invalid background hex color format, expected #rrggbb such as #7a1fd4");
        }
        match u32::from_str_radix(hex, 16) {
            Ok(hex_num) => Ok(Rgb::from_hex(hex_num)),
            _ => Err("Invalid background hex color format, expected #rrggbb such as #7a1fd4"),
        }
    } else {
        Err("Invalid background color format, expected rgb(r,g,b) or #rrggbb such as rgb(122,31,212) or #7a1fd4")
    }
}

/// Parses a background color into 8 bit channels
pub fn parse_rgb8(color_str: &str) -> Result<[u8; 3], &'static str> {
    parse_color(color_str).map(|rgb| [rgb.r as u8, rgb.g as u8, rgb.b as u8])
}
