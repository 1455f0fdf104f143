//! End-to-end analysis of small Python trees.

mod common;

use common::{analyze_tree, analyze_with, cycle_paths, python_tree, strings, write_file};
use indoc::indoc;
use layermap::config::{ResolutionConfig, ResolutionKind};
use layermap::{analyze, render, AnalyzeOptions, CancellationToken, DiagnosticKind, ReportFormat};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

#[test]
fn test_mutual_import_yields_one_cycle() {
    let tree = python_tree(&[("a.py", "import b\n"), ("b.py", "import a\n")]);
    let result = analyze_tree(tree.path());

    assert!(result.has_cycles);
    assert_eq!(result.cycle_count, 1);
    assert_eq!(cycle_paths(&result), vec![strings(&["a", "b", "a"])]);
    assert_eq!(result.unlayerable, strings(&["a", "b"]));
    assert!(result.layers.is_empty());
    assert!(result.layer_error.is_none());
}

#[test]
fn test_self_import_yields_two_element_cycle() {
    let tree = python_tree(&[
        ("loop.py", "import loop\n"),
        ("other.py", "import loop\n"),
    ]);
    let result = analyze_tree(tree.path());

    assert_eq!(cycle_paths(&result), vec![strings(&["loop", "loop"])]);
    assert_eq!(result.edge_count, 1);
    assert!(result.module("loop").unwrap().self_import);
    assert_eq!(result.layers, vec![strings(&["other"])]);
}

#[test]
fn test_diamond_is_layered() {
    let tree = python_tree(&[
        ("a.py", "import b\nimport c\n"),
        ("b.py", "import d\n"),
        ("c.py", "from d import thing\n"),
        ("d.py", "VALUE = 1\n"),
    ]);
    let result = analyze_tree(tree.path());

    assert!(!result.has_cycles);
    assert!(result.is_clean());
    assert_eq!(
        result.layers,
        vec![strings(&["d"]), strings(&["b", "c"]), strings(&["a"])]
    );
    let layer = |name: &str| result.module(name).unwrap().layer.unwrap();
    assert!(layer("d") < layer("b"));
    assert!(layer("d") < layer("c"));
    assert_eq!(layer("a"), result.layers.len() - 1);
}

#[test]
fn test_unresolved_imports_are_tallied_not_graphed() {
    let tree = python_tree(&[
        ("app.py", "import requests\nimport os, sys\nfrom lib import helper\nimport requests\n"),
        ("lib.py", "import numpy as np\n"),
    ]);
    let result = analyze_tree(tree.path());

    assert_eq!(result.edge_count, 1);
    assert_eq!(result.unresolved_import_count, 4);
    let app = result.module("app").unwrap();
    assert_eq!(app.resolved, strings(&["lib"]));
    assert_eq!(app.unresolved, strings(&["os", "requests", "sys"]));
    assert_eq!(result.module("lib").unwrap().unresolved, strings(&["numpy"]));
}

#[test]
fn test_missing_submodules_stay_unresolved() {
    let tree = python_tree(&[
        ("app/__init__.py", ""),
        ("app/views.py", "import app.missing\n"),
        ("util.py", ""),
        ("main.py", "import util.nothere\n"),
    ]);
    let result = analyze_tree(tree.path());

    assert_eq!(result.edge_count, 0);
    assert_eq!(result.unresolved_import_count, 2);
    assert!(!result.has_cycles);
    let views = result.module("app.views").unwrap();
    assert!(views.resolved.is_empty());
    assert_eq!(views.unresolved, strings(&["app.missing"]));
    assert_eq!(result.module("main").unwrap().unresolved, strings(&["util.nothere"]));
}

#[test]
fn test_from_package_import_of_attribute_targets_package() {
    let tree = python_tree(&[
        ("app/__init__.py", "from . import VERSION\nVERSION = '1.0'\n"),
        ("app/views.py", "from . import VERSION, models\n"),
        ("app/models.py", ""),
    ]);
    let result = analyze_tree(tree.path());

    assert_eq!(
        result.module("app.views").unwrap().resolved,
        strings(&["app", "app.models"])
    );
    let package = result.module("app").unwrap();
    assert!(package.resolved.is_empty());
    assert!(!package.self_import);
    assert!(!result.has_cycles);
    assert_eq!(result.unresolved_import_count, 0);
}

#[test]
fn test_relative_imports_inside_packages() {
    let tree = python_tree(&[
        ("shop/__init__.py", "from .cart import Cart\n"),
        ("shop/cart.py", "from .pricing import total\nfrom ..util import log\n"),
        ("shop/pricing.py", "from . import tax\n"),
        ("shop/tax.py", ""),
        ("util.py", ""),
    ]);
    let result = analyze_tree(tree.path());

    assert!(!result.has_cycles);
    assert_eq!(result.module("shop").unwrap().resolved, strings(&["shop.cart"]));
    assert_eq!(
        result.module("shop.cart").unwrap().resolved,
        strings(&["shop.pricing", "util"])
    );
    assert_eq!(
        result.module("shop.pricing").unwrap().resolved,
        strings(&["shop.tax"])
    );
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_syntax_error_falls_back_and_is_diagnosed() {
    let tree = python_tree(&[
        ("broken.py", indoc! {"
            import good
            def oops(:
                pass
        "}),
        ("good.py", ""),
    ]);
    let result = analyze_tree(tree.path());

    assert_eq!(result.module("broken").unwrap().resolved, strings(&["good"]));
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(
        result.diagnostics[0].kind,
        DiagnosticKind::StructuralParseFailed
    );
    // per-file diagnostics are informational
    assert!(result.is_clean());
}

#[test]
fn test_test_files_and_artifacts_are_skipped() {
    let tree = python_tree(&[
        ("app.py", ""),
        ("test_app.py", "import app\n"),
        ("conftest.py", ""),
        ("__pycache__/app.cpython-312.py", ""),
        ("build/lib/app.py", ""),
    ]);
    let result = analyze_tree(tree.path());
    assert_eq!(result.total_modules, 1);

    let with_tests = analyze_with(
        tree.path(),
        AnalyzeOptions {
            include_tests: true,
            ..Default::default()
        },
    );
    assert_eq!(with_tests.total_modules, 3);
}

#[test]
fn test_exclude_patterns_and_depth_limit() {
    let tree = python_tree(&[
        ("top.py", ""),
        ("pkg/mid.py", ""),
        ("pkg/deep/leaf.py", ""),
        ("legacy/old.py", ""),
    ]);

    let result = analyze_with(
        tree.path(),
        AnalyzeOptions {
            exclude_patterns: vec!["legacy".into(), "[".into()],
            follow_depth_limit: Some(1),
            ..Default::default()
        },
    );
    let names: Vec<_> = result.modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["pkg.mid", "top"]);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].kind, DiagnosticKind::InvalidPattern);
}

#[test]
fn test_missing_root_is_a_warning() {
    let tree = python_tree(&[]);
    let missing = tree.path().join("nope");
    let result = analyze_tree(&missing);

    assert_eq!(result.total_modules, 0);
    assert!(!result.has_cycles);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].kind, DiagnosticKind::RootMissing);
    assert!(!result.is_clean());
}

#[test]
fn test_package_shadows_module_file() {
    let tree = python_tree(&[
        ("tools.py", ""),
        ("tools/__init__.py", ""),
        ("main.py", "import tools\n"),
    ]);
    let result = analyze_tree(tree.path());

    assert_eq!(result.total_modules, 2);
    assert!(result.module("tools").unwrap().is_package);
    assert_eq!(result.warnings[0].kind, DiagnosticKind::ShadowedModule);
}

#[test]
fn test_namespace_resolution_from_options() {
    let tree = python_tree(&[
        ("src/acme/__init__.py", ""),
        ("src/acme/billing.py", "import acme\n"),
        ("main.py", "import acme.billing\nimport billing\n"),
    ]);
    let options = AnalyzeOptions {
        resolution: ResolutionConfig {
            strategy: ResolutionKind::Namespace,
            namespaces: BTreeMap::from([("acme".to_string(), "src.acme".to_string())]),
        },
        ..Default::default()
    };
    let result = analyze_with(tree.path(), options);

    assert_eq!(
        result.module("main").unwrap().resolved,
        strings(&["src.acme.billing"])
    );
    assert_eq!(result.module("main").unwrap().unresolved, strings(&["billing"]));
    assert_eq!(
        result.module("src.acme.billing").unwrap().resolved,
        strings(&["src.acme"])
    );
}

#[test]
fn test_reports_are_byte_identical_across_runs() {
    let tree = python_tree(&[
        ("a.py", "import b\nimport c\n"),
        ("b.py", "import c\nimport a\n"),
        ("c.py", "import json\n"),
        ("pkg/__init__.py", "from . import x\n"),
        ("pkg/x.py", "import pkg\n"),
    ]);

    for format in [ReportFormat::Text, ReportFormat::Structured, ReportFormat::Dot] {
        let first = render(&analyze_tree(tree.path()), format, true).unwrap();
        let second = render(
            &analyze_with(
                tree.path(),
                AnalyzeOptions {
                    jobs: 4,
                    ..Default::default()
                },
            ),
            format,
            true,
        )
        .unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_cancelled_scan_returns_error() {
    let tree = python_tree(&[("a.py", "import b\n"), ("b.py", "")]);
    let cancel = CancellationToken::new();
    let options = AnalyzeOptions {
        cancel: cancel.clone(),
        ..Default::default()
    };

    assert!(analyze(tree.path(), &options).is_ok());
    cancel.cancel();
    let err = analyze(tree.path(), &options).unwrap_err();
    assert!(err.is_cancelled());
}

#[test]
fn test_fresh_scan_sees_changed_files() {
    let tree = python_tree(&[("a.py", "import b\n"), ("b.py", "")]);
    assert!(!analyze_tree(tree.path()).has_cycles);

    write_file(tree.path(), "b.py", "import a\n");
    assert!(analyze_tree(tree.path()).has_cycles);
}
