//! A rendered configuration resolves back to the same settings.

use archconf_types::{load_preset, load_str, Features, MpiMode, ResolveOptions};

#[test]
fn rendered_presets_resolve_to_same_fingerprint() {
    for (name, mpi, netcdf) in [
        ("linux_intel", MpiMode::Auto, false),
        ("linux_gfortran", MpiMode::Auto, true),
        ("linux_gfortran_openmpi", MpiMode::Enabled, true),
    ] {
        let opts = ResolveOptions {
            features: Features { mpi, netcdf },
            ..ResolveOptions::default()
        };
        let cfg = load_preset(name, &opts).unwrap();
        let text = cfg.render();
        let again = load_str(name, "<rendered>", &text, &opts)
            .unwrap_or_else(|e| panic!("{name}: rendered file failed: {e}\n{text}"));
        assert_eq!(cfg.fingerprint(), again.fingerprint(), "{name}\n{text}");
    }
}

#[test]
fn rendered_text_is_expanded() {
    let cfg = load_preset("linux_intel", &ResolveOptions::default()).unwrap();
    let text = cfg.render();
    assert!(text.contains("LD        = mpiifx\n"), "{text}");
    assert!(text.contains("OPT_LNK   = -O3 -cpp -qopenmp\n"), "{text}");
    assert!(text.contains("OBJ_MPI   =\n"), "{text}");
    assert!(!text.contains("$("));
}

#[test]
fn dollar_signs_survive_rendering() {
    let src = "FC = gfortran\nLD = $(FC)\nAR = ar\nRANLIB = ranlib\nOPT = -cpp\n\
               LINK_LIBS = -llapack -Wl,-rpath,$$ORIGIN\nOBJ_MPI = nullmpi.o\n";
    let cfg = load_str("t", "<t>", src, &ResolveOptions::default()).unwrap();
    assert_eq!(cfg.linkage().tokens()[1], "-Wl,-rpath,$ORIGIN");
    let again = load_str("t", "<t>", &cfg.render(), &ResolveOptions::default()).unwrap();
    assert_eq!(again.linkage().tokens()[1], "-Wl,-rpath,$ORIGIN");
}

#[test]
fn trailing_backslash_does_not_join_lines() {
    let src = "FC = gfortran\nLD = $(FC)\nAR = ar\nRANLIB = ranlib\nOPT = -cpp\n\
               LINK_LIBS = -llapack\nOBJ_MPI = nullmpi.o\n";
    let opts = ResolveOptions {
        overrides: vec!["CPP_DEFS=-DUSE_PDAF -DTAG=a\\".parse().unwrap()],
        ..ResolveOptions::default()
    };
    let cfg = load_str("t", "<t>", src, &opts).unwrap();
    assert_eq!(cfg.defines().tokens(), vec!["-DUSE_PDAF", "-DTAG=a\\"]);

    let text = cfg.render();
    let again = load_str("t", "<rendered>", &text, &ResolveOptions::default())
        .unwrap_or_else(|e| panic!("rendered file failed: {e}\n{text}"));
    assert_eq!(again.defines().tokens(), cfg.defines().tokens());
    assert_eq!(again.optimization().compile_flags(), ["-cpp"], "{text}");
    assert_eq!(cfg.fingerprint(), again.fingerprint());
}
