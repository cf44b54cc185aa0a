//! Font resolution never fails; it degrades to the built-in font.
//!
//! `tests/fixtures/Tuffy.ttf` is a public-domain face used for the
//! outline paths.

use photomark::font::{FontRegistry, FontRegistryConfig, FontSource};
use photomark::watermark::{WatermarkRenderer, WatermarkSpec};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[test]
fn test_unknown_font_falls_back_to_builtin() {
    let registry = FontRegistry::new(FontRegistryConfig::builtin_only());
    let handle = registry.resolve(Some("Definitely Not Installed"), 32);

    assert_eq!(handle.source(), &FontSource::Builtin);
    assert!(handle.is_degraded());
    assert_eq!(handle.size(), 32);
    let (w, h) = handle.measure("ABC");
    assert!(w > 0 && h > 0);
}

#[test]
fn test_same_request_returns_cached_handle() {
    let registry = FontRegistry::new(FontRegistryConfig::builtin_only());
    let a = registry.resolve(None, 24);
    let b = registry.resolve(None, 24);
    let c = registry.resolve(None, 48);

    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(registry.cached_count(), 2);

    registry.clear_cache();
    assert_eq!(registry.cached_count(), 0);
}

#[test]
fn test_broken_local_fonts_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.ttf"), b"not a font").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let registry = FontRegistry::new(FontRegistryConfig {
        local_dir: Some(dir.path().to_path_buf()),
        ..FontRegistryConfig::builtin_only()
    });

    assert_eq!(registry.resolve(None, 20).source(), &FontSource::Builtin);
}

#[test]
fn test_cache_bound_evicts_oldest() {
    let registry = FontRegistry::new(FontRegistryConfig {
        max_cached_fonts: Some(2),
        ..FontRegistryConfig::builtin_only()
    });

    let first = registry.resolve(None, 10);
    registry.resolve(None, 11);
    registry.resolve(None, 12);
    assert_eq!(registry.cached_count(), 2);

    // Size 10 was evicted, so this is a fresh handle
    assert!(!Arc::ptr_eq(&first, &registry.resolve(None, 10)));
}

#[test]
fn test_concurrent_resolution_shares_one_handle() {
    let registry = Arc::new(FontRegistry::new(FontRegistryConfig::builtin_only()));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.resolve(Some("Shared"), 18))
        })
        .collect();

    let resolved: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(resolved.iter().all(|h| Arc::ptr_eq(h, &resolved[0])));
    assert_eq!(registry.cached_count(), 1);
}

fn fixture_font() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("Tuffy.ttf")
}

/// First installed family backed by a plain .ttf/.otf file, if any.
fn installed_family() -> Option<String> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    let family = db.faces().find_map(|face| match &face.source {
        fontdb::Source::File(path)
            if matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("ttf" | "otf")
            ) =>
        {
            face.families.first().map(|(name, _)| name.clone())
        }
        _ => None,
    });
    family
}

#[test]
fn test_absolute_font_path_loads_outline_face() {
    let registry = FontRegistry::new(FontRegistryConfig::builtin_only());
    let path = fixture_font();
    let handle = registry.resolve(path.to_str(), 32);

    assert_eq!(handle.source(), &FontSource::File(path));
    assert!(!handle.is_degraded());
    assert!(handle.covers("Tuffy"));

    let (w, h) = handle.measure("Tuffy");
    assert!(w > 0 && h > 0);
    assert!(handle.measure("TuffyTuffy").0 > w);
}

#[test]
fn test_outline_rasterize_stays_near_measured_box() {
    let registry = FontRegistry::new(FontRegistryConfig::builtin_only());
    let handle = registry.resolve(fixture_font().to_str(), 40);
    let (w, h) = handle.measure("Hg");

    let mut touched = 0;
    let mut inked = 0;
    handle.rasterize("Hg", 10, 10, |x, y, coverage| {
        touched += 1;
        if coverage > 0.5 {
            inked += 1;
            assert!(x >= 8 && x <= 12 + w as i32, "x {} outside box", x);
            assert!(y >= 8 && y <= 12 + h as i32, "y {} outside box", y);
        }
    });
    assert!(touched > 0);
    assert!(inked > 0);
}

#[test]
fn test_local_dir_font_is_used_when_no_name_given() {
    let dir = tempfile::tempdir().unwrap();
    let copied = dir.path().join("Tuffy.ttf");
    std::fs::copy(fixture_font(), &copied).unwrap();

    let registry = FontRegistry::new(FontRegistryConfig {
        local_dir: Some(dir.path().to_path_buf()),
        ..FontRegistryConfig::builtin_only()
    });
    let handle = registry.resolve(None, 24);

    assert_eq!(handle.source(), &FontSource::LocalDir(copied));
    assert!(!handle.is_degraded());
    assert!(handle.measure("abc").0 > 0);
}

#[test]
fn test_unknown_name_falls_through_to_local_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(fixture_font(), dir.path().join("Tuffy.ttf")).unwrap();

    let registry = FontRegistry::new(FontRegistryConfig {
        local_dir: Some(dir.path().to_path_buf()),
        ..FontRegistryConfig::builtin_only()
    });

    assert!(matches!(
        registry.resolve(Some("No Such Family"), 24).source(),
        FontSource::LocalDir(_)
    ));
}

#[test]
fn test_installed_family_by_name_and_as_fallback() {
    let Some(family) = installed_family() else {
        eprintln!("no system fonts installed, skipping");
        return;
    };

    let registry = FontRegistry::new(FontRegistryConfig {
        local_dir: None,
        fallback_families: vec!["No Such Family".to_string(), family.clone()],
        system_fonts: true,
        max_cached_fonts: None,
    });

    let named = registry.resolve(Some(&family), 20);
    assert_eq!(named.source(), &FontSource::System(family.clone()));
    assert!(!named.is_degraded());

    let fallback = registry.resolve(None, 20);
    assert_eq!(fallback.source(), &FontSource::Fallback(family));
    assert!(fallback.measure("abc").0 > 0);
}

#[test]
fn test_outline_text_watermark_inks_inside_padding() {
    let fonts = Arc::new(FontRegistry::new(FontRegistryConfig::builtin_only()));
    let renderer = WatermarkRenderer::new(fonts);
    let mut spec = WatermarkSpec::text("Tuffy").with_opacity(100);
    if let Some(text) = spec.as_text_mut() {
        text.font_name = fixture_font().to_str().map(str::to_string);
        text.font_size = 36;
    }

    let buffer = renderer.render_buffer(&spec).unwrap().unwrap();
    let (w, h) = buffer.dimensions();
    assert!(w > 20 && h > 20);

    let inner_opaque = buffer
        .enumerate_pixels()
        .filter(|(x, y, p)| (10..w - 10).contains(x) && (10..h - 10).contains(y) && p[3] >= 250)
        .count();
    assert!(inner_opaque > 0);
    assert_eq!(buffer.get_pixel(0, 0)[3], 0);
}
