use discord_api::{Embed, EmbedField, EmbedFooter, EmbedImage, MessagePayload};

use lootdrop_common::{Locale, Promotion, Storefront};

/// Discord hard-limits embed descriptions; vendor blurbs are clipped
/// well below that so the card stays scannable.
const DESCRIPTION_LIMIT: usize = 280;

fn headline(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Free for a limited time",
        Locale::De => "Für kurze Zeit kostenlos",
        Locale::Fr => "Gratuit pour une durée limitée",
        Locale::Es => "Gratis por tiempo limitado",
        Locale::It => "Gratis per un periodo limitato",
        Locale::Pl => "Za darmo przez ograniczony czas",
        Locale::PtBr => "Grátis por tempo limitado",
        Locale::Ru => "Бесплатно в течение ограниченного времени",
    }
}

fn until_label(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Free until",
        Locale::De => "Kostenlos bis",
        Locale::Fr => "Gratuit jusqu'au",
        Locale::Es => "Gratis hasta",
        Locale::It => "Gratis fino al",
        Locale::Pl => "Za darmo do",
        Locale::PtBr => "Grátis até",
        Locale::Ru => "Бесплатно до",
    }
}

fn price_label(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Original price",
        Locale::De => "Originalpreis",
        Locale::Fr => "Prix d'origine",
        Locale::Es => "Precio original",
        Locale::It => "Prezzo originale",
        Locale::Pl => "Cena pierwotna",
        Locale::PtBr => "Preço original",
        Locale::Ru => "Обычная цена",
    }
}

fn storefront_color(storefront: Storefront) -> u32 {
    match storefront {
        Storefront::Epic => 0x2f2d2e,
        Storefront::Steam => 0x1b2838,
        Storefront::Gog => 0x86328a,
        Storefront::Humble => 0xcc2929,
    }
}

/// Build the announcement embed for one promotion.
pub fn announcement(promotion: &Promotion, locale: Locale) -> MessagePayload {
    let mut fields = Vec::new();
    if let Some(price) = &promotion.original_price {
        fields.push(EmbedField {
            name: price_label(locale).to_string(),
            value: format!("~~{price}~~ → **0**"),
            inline: true,
        });
    }
    if let Some(ends_at) = promotion.ends_at {
        // Discord renders <t:..:f> in the reader's own timezone.
        fields.push(EmbedField {
            name: until_label(locale).to_string(),
            value: format!("<t:{}:f>", ends_at.timestamp()),
            inline: true,
        });
    }

    let description = clip(&promotion.description, DESCRIPTION_LIMIT);

    let embed = Embed {
        title: Some(format!("{} — {}", headline(locale), promotion.title)),
        description: (!description.is_empty()).then_some(description),
        url: Some(promotion.url.clone()),
        color: Some(storefront_color(promotion.storefront)),
        image: promotion
            .image_url
            .clone()
            .map(|url| EmbedImage { url }),
        fields,
        footer: Some(EmbedFooter {
            text: promotion.storefront.display_name().to_string(),
        }),
        timestamp: promotion.starts_at.map(|t| t.to_rfc3339()),
    };

    MessagePayload {
        content: None,
        embeds: vec![embed],
        flags: None,
    }
}

/// The role-ping line placed above the embed, in configured order.
/// `None` when the guild pings nobody.
pub fn mention_preamble(mention_roles: &[String]) -> Option<String> {
    if mention_roles.is_empty() {
        return None;
    }
    Some(
        mention_roles
            .iter()
            .map(|role| format!("<@&{role}>"))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

fn clip(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let clipped: String = text.chars().take(limit.saturating_sub(1)).collect();
    format!("{}…", clipped.trim_end())
}
