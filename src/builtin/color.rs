//! `sass:color` plus the legacy global color functions, grounded in the
//! `grass` forks' `builtin::functions::color` module
//! (`other_examples/*grass*__src-builtin-functions-color-rgb.rs.rs`) and
//! generalized onto this crate's `SassColor`.

use std::rc::Rc;

use crate::error::{SassError, SassResult};
use crate::value::{Callable, SassColor, Value};

use super::builtin;

fn channel(args: &crate::value::ArgList, index: usize, name: &str, span: codemap::Span) -> SassResult<f64> {
    Ok(args
        .get(index, name)
        .ok_or_else(|| SassError::arity(format!("Missing argument ${}.", name), span))?
        .assert_number_with_name(name, span)?
        .value)
}

fn color_arg(args: &crate::value::ArgList, span: codemap::Span) -> SassResult<SassColor> {
    Ok(args
        .get(0, "color")
        .ok_or_else(|| SassError::arity("Missing argument $color.", span))?
        .assert_color_with_name("color", span)?
        .clone())
}

pub fn functions() -> Vec<(String, Rc<Callable>)> {
    vec![
        builtin("rgb", |_, args, span| make_rgb(&args, span)),
        builtin("rgba", |_, args, span| make_rgb(&args, span)),
        builtin("hsl", |_, args, span| make_hsl(&args, span)),
        builtin("hsla", |_, args, span| make_hsl(&args, span)),
        builtin("red", |_, args, span| Ok(Value::number(color_arg(&args, span)?.red()))),
        builtin("green", |_, args, span| Ok(Value::number(color_arg(&args, span)?.green()))),
        builtin("blue", |_, args, span| Ok(Value::number(color_arg(&args, span)?.blue()))),
        builtin("alpha", |_, args, span| Ok(Value::number(color_arg(&args, span)?.alpha()))),
        builtin("opacity", |_, args, span| Ok(Value::number(color_arg(&args, span)?.alpha()))),
        builtin("hue", |_, args, span| Ok(Value::number_with_unit(color_arg(&args, span)?.hue(), crate::value::Unit::Deg))),
        builtin("saturation", |_, args, span| {
            Ok(Value::number_with_unit(color_arg(&args, span)?.saturation(), crate::value::Unit::Percent))
        }),
        builtin("lightness", |_, args, span| {
            Ok(Value::number_with_unit(color_arg(&args, span)?.lightness(), crate::value::Unit::Percent))
        }),
        builtin("whiteness", |_, args, span| {
            Ok(Value::number_with_unit(color_arg(&args, span)?.whiteness(), crate::value::Unit::Percent))
        }),
        builtin("blackness", |_, args, span| {
            Ok(Value::number_with_unit(color_arg(&args, span)?.blackness(), crate::value::Unit::Percent))
        }),
        builtin("mix", |_, args, span| {
            let a = args
                .get(0, "color1")
                .ok_or_else(|| SassError::arity("Missing argument $color1.", span))?
                .assert_color_with_name("color1", span)?;
            let b = args
                .get(1, "color2")
                .ok_or_else(|| SassError::arity("Missing argument $color2.", span))?
                .assert_color_with_name("color2", span)?;
            let weight = args
                .get(2, "weight")
                .map(|v| v.assert_number_with_name("weight", span))
                .transpose()?
                .map(|n| n.value)
                .unwrap_or(50.0)
                / 100.0;
            Ok(Value::Color(mix_colors(a, b, weight)))
        }),
        builtin("complement", |_, args, span| {
            let c = color_arg(&args, span)?;
            Ok(Value::Color(SassColor::from_hsla(
                (c.hue() + 180.0).rem_euclid(360.0),
                c.saturation(),
                c.lightness(),
                c.alpha(),
            )))
        }),
        builtin("invert", |_, args, span| {
            let c = color_arg(&args, span)?;
            let weight = args
                .get(1, "weight")
                .map(|v| v.assert_number_with_name("weight", span))
                .transpose()?
                .map(|n| n.value)
                .unwrap_or(100.0)
                / 100.0;
            let inverted = SassColor::from_rgba(255.0 - c.red(), 255.0 - c.green(), 255.0 - c.blue(), c.alpha());
            Ok(Value::Color(mix_colors(&inverted, &c, weight)))
        }),
        builtin("grayscale", |_, args, span| {
            let c = color_arg(&args, span)?;
            Ok(Value::Color(SassColor::from_hsla(c.hue(), 0.0, c.lightness(), c.alpha())))
        }),
        builtin("lighten", |_, args, span| {
            let c = color_arg(&args, span)?;
            let amount = channel(&args, 1, "amount", span)?;
            Ok(Value::Color(SassColor::from_hsla(
                c.hue(),
                c.saturation(),
                (c.lightness() + amount).min(100.0).max(0.0),
                c.alpha(),
            )))
        }),
        builtin("darken", |_, args, span| {
            let c = color_arg(&args, span)?;
            let amount = channel(&args, 1, "amount", span)?;
            Ok(Value::Color(SassColor::from_hsla(
                c.hue(),
                c.saturation(),
                (c.lightness() - amount).min(100.0).max(0.0),
                c.alpha(),
            )))
        }),
        builtin("saturate", |_, args, span| {
            let c = color_arg(&args, span)?;
            let amount = channel(&args, 1, "amount", span)?;
            Ok(Value::Color(SassColor::from_hsla(
                c.hue(),
                (c.saturation() + amount).min(100.0).max(0.0),
                c.lightness(),
                c.alpha(),
            )))
        }),
        builtin("desaturate", |_, args, span| {
            let c = color_arg(&args, span)?;
            let amount = channel(&args, 1, "amount", span)?;
            Ok(Value::Color(SassColor::from_hsla(
                c.hue(),
                (c.saturation() - amount).min(100.0).max(0.0),
                c.lightness(),
                c.alpha(),
            )))
        }),
        builtin("adjust-hue", |_, args, span| {
            let c = color_arg(&args, span)?;
            let amount = channel(&args, 1, "degrees", span)?;
            Ok(Value::Color(SassColor::from_hsla(
                (c.hue() + amount).rem_euclid(360.0),
                c.saturation(),
                c.lightness(),
                c.alpha(),
            )))
        }),
        builtin("opacify", |_, args, span| adjust_alpha(&args, span, 1.0)),
        builtin("fade-in", |_, args, span| adjust_alpha(&args, span, 1.0)),
        builtin("transparentize", |_, args, span| adjust_alpha(&args, span, -1.0)),
        builtin("fade-out", |_, args, span| adjust_alpha(&args, span, -1.0)),
        builtin("change-color", |_, args, span| change_color(&args, span)),
        builtin("adjust-color", |_, args, span| adjust_color(&args, span)),
        builtin("scale-color", |_, args, span| scale_color(&args, span)),
        builtin("ie-hex-str", |_, args, span| {
            let c = color_arg(&args, span)?;
            let a = (c.alpha() * 255.0).round() as u8;
            Ok(Value::unquoted_string(format!(
                "#{:02X}{:02X}{:02X}{:02X}",
                a,
                c.red() as u8,
                c.green() as u8,
                c.blue() as u8
            )))
        }),
        // Module-qualified aliases (`color.adjust`, `color.scale`, `color.change`)
        // so `@use "sass:color"` exposes the same operations under their
        // documented module names.
        builtin("adjust", |_, args, span| adjust_color(&args, span)),
        builtin("scale", |_, args, span| scale_color(&args, span)),
        builtin("change", |_, args, span| change_color(&args, span)),
    ]
}

fn adjust_alpha(args: &crate::value::ArgList, span: codemap::Span, sign: f64) -> SassResult<Value> {
    let c = color_arg(args, span)?;
    let amount = channel(args, 1, "amount", span)?;
    Ok(Value::Color(c.with_alpha((c.alpha() + sign * amount).min(1.0).max(0.0))))
}

fn named_f64(args: &crate::value::ArgList, name: &str, span: codemap::Span) -> SassResult<Option<f64>> {
    args.named
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.assert_number_with_name(name, span).map(|n| n.value))
        .transpose()
}

fn change_color(args: &crate::value::ArgList, span: codemap::Span) -> SassResult<Value> {
    let c = color_arg(args, span)?;
    let red = named_f64(args, "red", span)?.unwrap_or(c.red());
    let green = named_f64(args, "green", span)?.unwrap_or(c.green());
    let blue = named_f64(args, "blue", span)?.unwrap_or(c.blue());
    let alpha = named_f64(args, "alpha", span)?.unwrap_or(c.alpha());
    if let Some(hue) = named_f64(args, "hue", span)? {
        let saturation = named_f64(args, "saturation", span)?.unwrap_or(c.saturation());
        let lightness = named_f64(args, "lightness", span)?.unwrap_or(c.lightness());
        return Ok(Value::Color(SassColor::from_hsla(hue, saturation, lightness, alpha)));
    }
    Ok(Value::Color(SassColor::from_rgba(red, green, blue, alpha)))
}

fn adjust_color(args: &crate::value::ArgList, span: codemap::Span) -> SassResult<Value> {
    let c = color_arg(args, span)?;
    let red = c.red() + named_f64(args, "red", span)?.unwrap_or(0.0);
    let green = c.green() + named_f64(args, "green", span)?.unwrap_or(0.0);
    let blue = c.blue() + named_f64(args, "blue", span)?.unwrap_or(0.0);
    let alpha = (c.alpha() + named_f64(args, "alpha", span)?.unwrap_or(0.0)).min(1.0).max(0.0);
    let hue_delta = named_f64(args, "hue", span)?;
    let sat_delta = named_f64(args, "saturation", span)?;
    let light_delta = named_f64(args, "lightness", span)?;
    if hue_delta.is_some() || sat_delta.is_some() || light_delta.is_some() {
        let hue = (c.hue() + hue_delta.unwrap_or(0.0)).rem_euclid(360.0);
        let saturation = (c.saturation() + sat_delta.unwrap_or(0.0)).min(100.0).max(0.0);
        let lightness = (c.lightness() + light_delta.unwrap_or(0.0)).min(100.0).max(0.0);
        return Ok(Value::Color(SassColor::from_hsla(hue, saturation, lightness, alpha)));
    }
    Ok(Value::Color(SassColor::from_rgba(
        red.min(255.0).max(0.0),
        green.min(255.0).max(0.0),
        blue.min(255.0).max(0.0),
        alpha,
    )))
}

fn scale_color(args: &crate::value::ArgList, span: codemap::Span) -> SassResult<Value> {
    let c = color_arg(args, span)?;
    let scale = |current: f64, max: f64, delta: Option<f64>| -> f64 {
        match delta {
            Some(pct) if pct >= 0.0 => current + (max - current) * (pct / 100.0),
            Some(pct) => current + current * (pct / 100.0),
            None => current,
        }
    };
    let hue = c.hue();
    let saturation = scale(c.saturation(), 100.0, named_f64(args, "saturation", span)?);
    let lightness = scale(c.lightness(), 100.0, named_f64(args, "lightness", span)?);
    let alpha = scale(c.alpha() * 100.0, 100.0, named_f64(args, "alpha", span)?) / 100.0;
    let red = scale(c.red(), 255.0, named_f64(args, "red", span)?);
    let green = scale(c.green(), 255.0, named_f64(args, "green", span)?);
    let blue = scale(c.blue(), 255.0, named_f64(args, "blue", span)?);
    let has_rgb = named_f64(args, "red", span)?.is_some()
        || named_f64(args, "green", span)?.is_some()
        || named_f64(args, "blue", span)?.is_some();
    if has_rgb {
        Ok(Value::Color(SassColor::from_rgba(red, green, blue, alpha.min(1.0).max(0.0))))
    } else {
        Ok(Value::Color(SassColor::from_hsla(hue, saturation, lightness, alpha.min(1.0).max(0.0))))
    }
}

fn mix_colors(a: &SassColor, b: &SassColor, weight: f64) -> SassColor {
    let weight = weight.min(1.0).max(0.0);
    let alpha_distance = a.alpha() - b.alpha();
    let normalized_weight = 2.0 * weight - 1.0;
    let combined = normalized_weight * alpha_distance;
    let w1 = if (combined - -1.0).abs() < f64::EPSILON {
        normalized_weight
    } else {
        (normalized_weight + alpha_distance) / (1.0 + combined)
    };
    let w1 = (w1 + 1.0) / 2.0;
    let w2 = 1.0 - w1;
    SassColor::from_rgba(
        a.red() * w1 + b.red() * w2,
        a.green() * w1 + b.green() * w2,
        a.blue() * w1 + b.blue() * w2,
        a.alpha() * weight + b.alpha() * (1.0 - weight),
    )
}

fn make_rgb(args: &crate::value::ArgList, span: codemap::Span) -> SassResult<Value> {
    if args.positional.len() == 2 {
        if let Value::Color(c) = &args.positional[0] {
            let alpha = args.positional[1].assert_number(span)?.value;
            return Ok(Value::Color(c.with_alpha(alpha)));
        }
    }
    if args.positional.len() == 1 {
        // A single space-separated list argument is the `rgb(r g b / a)` form.
        if let Value::List(items, ..) = &args.positional[0] {
            return make_rgb_from_items(items, span);
        }
    }
    make_rgb_from_items(&args.positional, span)
}

fn make_rgb_from_items(items: &[Value], span: codemap::Span) -> SassResult<Value> {
    if items.len() < 3 {
        return Err(SassError::arity("Expected red, green, and blue channels.".to_string(), span));
    }
    let chan = |v: &Value| -> SassResult<f64> { Ok(v.assert_number(span)?.value) };
    let red = chan(&items[0])?;
    let green = chan(&items[1])?;
    let blue = chan(&items[2])?;
    let alpha = if items.len() > 3 { chan(&items[3])? } else { 1.0 };
    Ok(Value::Color(SassColor::from_rgba(red, green, blue, alpha)))
}

fn make_hsl(args: &crate::value::ArgList, span: codemap::Span) -> SassResult<Value> {
    let items: Vec<Value> = if args.positional.len() == 1 {
        if let Value::List(items, ..) = &args.positional[0] {
            items.clone()
        } else {
            args.positional.clone()
        }
    } else {
        args.positional.clone()
    };
    if items.len() < 3 {
        return Err(SassError::arity("Expected hue, saturation, and lightness.".to_string(), span));
    }
    let hue = items[0].assert_number(span)?.value;
    let saturation = items[1].assert_number(span)?.value;
    let lightness = items[2].assert_number(span)?.value;
    let alpha = if items.len() > 3 { items[3].assert_number(span)?.value } else { 1.0 };
    Ok(Value::Color(SassColor::from_hsla(hue, saturation, lightness, alpha)))
}
