//! Built-in profile for the Temu product import template.
//!
//! Column letters follow the "Template" sheet of the Temu bulk-upload
//! workbook; data starts below the four header rows.

use std::collections::BTreeMap;

use super::{
    columns_between, default_placeholders, AggregateSettings, CategoryRule, ClassifySettings,
    ColumnTarget, DestinationSettings, DimensionPolicy, FilterSettings, NormalizeSettings,
    Profile, SanitizeSettings, SourceSettings, Split,
};

/// Cap per bullet-point cell.
pub const BULLET_MAX_LEN: usize = 700;

/// Cap for the single SKU image URL cell.
pub const SKU_IMAGE_MAX_LEN: usize = 512;

/// The Temu template profile.
pub fn temu_profile() -> Profile {
    Profile {
        name: "temu".to_string(),
        description: "Plenty product export → Temu bulk-upload template".to_string(),
        source: SourceSettings::default(),
        destination: DestinationSettings {
            sheet_name: "Template".to_string(),
            start_row: 5,
        },
        normalize: NormalizeSettings {
            quantity_field: Some("Anzahl".to_string()),
            quantity_default: "1".to_string(),
            availability_field: Some("Nicht verfügbar für Listenpreis".to_string()),
            availability_marker: "N/A".to_string(),
            country_field: Some("Ursprungsland/-region".to_string()),
            country_map: country_map(),
            dimension_fields: vec![
                "Länge - mm".to_string(),
                "Breite - mm".to_string(),
                "Höhe - mm".to_string(),
            ],
            dimension: DimensionPolicy::default(),
        },
        aggregate: Some(AggregateSettings {
            source: "Gesamtartikelanzahl".to_string(),
            target: "Artikel".to_string(),
        }),
        classify: Some(ClassifySettings {
            target_field: "Kategorie".to_string(),
            text_fields: vec![
                "Produktbeschreibung".to_string(),
                "Produktname".to_string(),
                "Kategoriename".to_string(),
            ],
            rules: category_rules(),
        }),
        filter: FilterSettings {
            keyword_fields: vec!["Kategorie".to_string(), "Kategoriename".to_string()],
            excluded_keywords: vec!["garten".to_string(), "haushalt".to_string()],
            required_fields: vec![
                "Produktidentifikation".to_string(),
                "Listenpreis - EUR".to_string(),
                "URL für SKU-Bilder".to_string(),
            ],
            placeholder_values: default_placeholders(),
        },
        // underscores are common in image URLs and SKU ids
        sanitize: SanitizeSettings {
            markdown_markers: "*`#>".to_string(),
        },
        columns: column_mapping(),
    }
}

fn country_map() -> BTreeMap<String, String> {
    [
        ("Taiwan", "TW"),
        ("Deutschland", "Germany"),
        ("Polen", "Poland"),
        ("Türkei", "Türkiye"),
    ]
    .iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
}

fn column_mapping() -> Vec<ColumnTarget> {
    let single = ColumnTarget::single;
    // Both ranges are fixed and valid.
    let bullet_columns = columns_between("U", "Z").unwrap_or_default();
    let image_columns = columns_between("AA", "BX").unwrap_or_default();

    vec![
        single("Warennummer", "A"),
        single("SKU-ID", "B"),
        single("Status", "C"),
        single("Details", "D"),
        single("Kategorie", "E"),
        single("Kategoriename", "F"),
        single("Produkttyp", "G"),
        single("Produktname", "L"),
        single("Verkäufer Goods", "M"),
        single("Verkäufer SKU", "N"),
        single("Aktualisieren oder hinzufügen", "O"),
        single("Marke", "R"),
        single("Markenzeichen", "S"),
        single("Produktbeschreibung", "T"),
        ColumnTarget::sequence("Aufzählungspunkt", bullet_columns, Split::Bullets)
            .with_max_len(BULLET_MAX_LEN),
        ColumnTarget::sequence("URL für Detailbilder", image_columns, Split::Images),
        single("1081 - Oberflächenbehandlungsprozess", "CB"),
        single("1279 - Verwendungszweck", "CU"),
        single("Variationsdesign", "DA"),
        single("Farbe", "DB"),
        single("Material", "DE"),
        single("Kapazität", "DH"),
        single("Gewicht", "DJ"),
        single("Artikel", "DK"),
        single("Menge", "DL"),
        single("Modell", "DM"),
        single("URL für SKU-Bilder", "DO").with_max_len(SKU_IMAGE_MAX_LEN),
        single("Anzahl", "DZ"),
        single("Basispreis - EUR", "EA"),
        single("Referenzlink", "EB"),
        single("Listenpreis - EUR", "EC"),
        single("Nicht verfügbar für Listenpreis", "ED"),
        single("Gewicht des Pakets - g", "EE"),
        single("Länge - mm", "EF"),
        single("Breite - mm", "EG"),
        single("Höhe - mm", "EH"),
        single("SKU-Typ", "EI"),
        single("Einzeln verpackt", "EJ"),
        single("Gesamtverpackungsanzahl", "EK"),
        single("Verpackungseinheit", "EL"),
        single("Nettoinhalt", "EO"),
        single("Gesamtnettoinhalt", "EP"),
        single("Nettoinhaltseinheit", "EQ"),
        single("Versandvorlage", "ET"),
        single("Ursprungsland/-region", "EX"),
        single("Herkunftsregion", "EY"),
        single("SKU-Verpackungsinformationen (mit sichtbarem Etikett)", "EZ"),
        single("Ursprungsetikett & Herstellerinformationen", "GS"),
        single(
            "Wurden Produkte unter dieser Waren-ID nach dem 13. Dezember 2024 in der EU (oder Nordirland) platziert?",
            "GY",
        ),
        single("Produktidentifikation", "GZ"),
        single("Hersteller", "HA"),
        single("EU-Verantwortlicher", "HB"),
    ]
}

/// Category rules, most specific first.
fn category_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(
            21842,
            "Scheinwerferbaugruppen, Teile & Zubehör / Scheinwerferbaugruppen",
            &[
                r"\b(haupt|front)?scheinwerfer(n)?\b",
                r"\bhead\s*light(s)?\b",
                r"\bheadlight(s)?\b",
                r"\bnebelscheinwerfer(n)?\b",
                r"\b(tagfahrlicht|tfl)\b",
                r"\b(blinker|seitenblinker|blinklicht)(n)?\b",
                r"\b(standlicht|rücklicht|ruecklicht)\b",
                r"\b(leuchtmittel|birne(n)?|bulb(s)?)\b",
            ],
        ),
        CategoryRule::new(
            21792,
            "Kühlergrills",
            &[
                r"\b(kühler|kuehler)\s*grill\b",
                r"\bkühlergrill\b",
                r"\bfront\s*grill(e)?\b",
                r"\bfrontgrill\b",
                r"\bradiator\s*grill(e)?\b",
                r"\bgrillgitter\b",
                r"\bkühlergitter\b",
                r"\bgrille\b",
            ],
        ),
        CategoryRule::new(
            21873,
            "Spiegel & Teile / Außenspiegel",
            &[
                r"\b(außen|aussen)spiegel\b",
                r"\bseitenspiegel\b",
                r"\bspiegelkappe(n)?\b",
                r"\bspiegelglas\b",
                r"\bspiegelblinker\b",
                r"\b(wing\s*)?mirror(s)?\b",
            ],
        ),
        // Front lips before the generic spoiler rule.
        CategoryRule::new(
            22226,
            "Frontspoiler",
            &[
                r"\bfrontspoiler\b",
                r"\bfront\s*lip(pe)?\b",
                r"\bfrontlippe\b",
                r"\bsplitter\b",
                r"\bspoilerlippe\b",
                r"\b(front|vorder)\s*spoiler\b",
            ],
        ),
        CategoryRule::new(
            22229,
            "Spoiler",
            &[
                r"\bheckspoiler\b",
                r"\bhec?kspoiler\b",
                r"\bheckflügel\b",
                r"\bheckfluegel\b",
                r"\bdachspoiler\b",
                r"\brear\s*spoiler\b",
                r"\bwing\b",
                r"\bspoiler\b",
                r"\bdiffusor\b",
            ],
        ),
        CategoryRule::new(
            21775,
            "Stoßdämpfer",
            &[
                r"\b(stoß|stoss)dämpfer(n)?\b",
                r"\bshock\s*absorber(s)?\b",
                r"\bfederbein(e)?\b",
                r"\bgewinde\s*fahrwerk\b",
                r"\bcoilover(s)?\b",
            ],
        ),
        CategoryRule::new(21691, "Dämpfer", &[r"\bdämpfer(n)?\b", r"\bdamper(s)?\b"]),
        CategoryRule::new(
            21796,
            "Isolierung / Schall- und Wärmedämmung",
            &[
                r"\b(isolier(ung|material)|isolation)\b",
                r"\b(schall|geräusch|geraeusch)\s*dämm(ung|matte|material)\b",
                r"\b(wärme|waerme)\s*dämm(ung|matte|material)\b",
                r"\bhitze(schutz|schutzmatte)\b",
                r"\bthermo(matte|isolierung)\b",
                r"\b(alubutyl|bitumenmatte|dämmvlies)\b",
                r"\bnoise\s*(deadening|insulation)\b",
                r"\bheat\s*(shield|insulation)\b",
                r"\bsound\s*(deadening|proofing)\b",
                r"\bfire\s*wall\s*insulation\b",
                r"\bhood\s*insulation\b",
            ],
        ),
        CategoryRule::new(
            22066,
            "Diebstahlschutz / Schlüssel / Zugangssysteme / Fernbedienung / Funk & Fernsteuerung",
            &[
                r"\b(schlüssel|schluessel)\b",
                r"\bkey(s)?\b",
                r"\bkey\s*fob(s)?\b",
                r"\bfernbedienung(en)?\b",
                r"\bfunk\s*fernbedienung(en)?\b",
                r"\bremote(\s*control)?\b",
                r"\bremote\s*key\b",
                r"\bzentralverriegelung\b",
                r"\bcentral\s*locking\b",
                r"\btür\s*(öffner|oeffner)\b",
                r"\bdoor\s*(opener|unlock)\b",
            ],
        ),
        // Specific switches only, never "schalter" alone.
        CategoryRule::new(
            21903,
            "Innenraum / Innenraumschalter",
            &[
                r"\binnenraum(s)?\b",
                r"\binnenraumschalter\b",
                r"\bfensterheber(\s*schalter)?\b",
                r"\bwindow\s*switch\b",
                r"\blichtschalter\b",
                r"\btaster\b",
                r"\bbedienelement(e)?\b",
                r"\bschalterleiste\b",
            ],
        ),
        CategoryRule::new(
            21680,
            "Abgase & Emissionen / Auspuffrohre & -Endrohre",
            &[
                r"\bauspuff\b",
                r"\bendrohr(e)?\b",
                r"\babgas\b",
                r"\bflexrohr\b",
                r"\bdownpipe\b",
                r"\brohrschelle(n)?\b",
                r"\brohrverbinder\b",
                r"\bauspuff(rohr)?\b",
            ],
        ),
        CategoryRule::new(
            20555,
            "Riemen, Schläuche & Riemenscheiben / Schläuche / Flex",
            &[
                r"\bflex\s*schlauch\b",
                r"\bflexschlauch\b",
                r"\bflex\s*hose\b",
                r"\bflexible(r|s)?\s*schlauch\b",
                r"\b(kühlwasser|kuehlwasser)\s*schlauch\b",
                r"\b(wasser|luft|ansaug|turbo|unterdruck|kraftstoff)\s*schlauch\b",
                r"\bintercooler\s*schlauch\b",
            ],
        ),
        CategoryRule::new(
            21785,
            "Karosserie & Zierleisten / Karosserie / Karosseriesätze",
            &[
                r"\bkarosserie(satz|kit|teile)?\b",
                r"\bbody\s*kit\b",
                r"\bladekantenschutz\b",
                r"\bzierleiste(n)?\b",
                r"\bkantenschutz\b",
                r"\bnummernschildhalter\b",
                r"\bdomstrebe\b",
                r"\bstoßstange\b",
                r"\bstoßfänger\b",
                r"\bstossfaenger\b",
                r"\bschürze\b",
                r"\bschuerze\b",
                r"\bblende(n)?\b",
                r"\bverkleidung\b",
                r"\bvnummernschild\b",
            ],
        ),
    ]
}
