use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use lintrc_config::{merge, ConfigFile, ConfigRecord, Presets, Resolver};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;

const PATHS: &[&str] = &[
    "app/components/button.js",
    "app/templates/application.hbs",
    "tests/unit/button-test.js",
    "tests/integration/components/button-test.js",
    "vendor/lib.js",
    "legacy/old/module.js",
];

fn record(value: serde_json::Value) -> ConfigRecord {
    ConfigRecord::from_json(value).unwrap()
}

/// A preset chain shaped like a typical company ESLint setup
fn presets() -> Presets {
    Presets::new()
        .with(
            "eslint:recommended",
            record(json!({
                "rules": {
                    "no-unused-vars": "warn",
                    "no-empty": "error",
                    "no-undef": "error",
                    "no-console": "warn"
                }
            })),
        )
        .unwrap()
        .with(
            "plugin:ember/recommended",
            record(json!({
                "plugins": ["ember"],
                "rules": {"ember/no-jquery": "error", "ember/no-classic-classes": "error"},
                "overrides": [
                    {"files": ["tests/**/*.js"], "env": {"qunit": true}},
                    {"files": ["**/*.hbs"], "rules": {"ember/no-jquery": "off"}}
                ]
            })),
        )
        .unwrap()
        .with(
            "company",
            record(json!({
                "extends": ["eslint:recommended", "plugin:ember/recommended"],
                "root": true,
                "parser": "babel-eslint",
                "parserOptions": {"ecmaVersion": 2017, "sourceType": "module"},
                "plugins": ["brackets", "import", "prefer-let"],
                "env": {"browser": true, "es6": true},
                "rules": {
                    "indent": ["error", 2, {"SwitchCase": 1}],
                    "no-unused-vars": ["error", {"vars": "all", "args": "after-used"}],
                    "import/first": 2
                }
            })),
        )
        .unwrap()
}

fn resolver() -> Resolver {
    let config = ConfigFile::from_record(record(json!({
        "extends": "company",
        "plugins": ["qunit"],
        "overrides": [
            {"files": ["tests/**/*-test.js"], "rules": {"import/first": "off"}},
            {"files": ["{legacy,vendor}/**"], "excludedFiles": ["vendor/keep/**"], "rules": {"indent": "off"}},
            {"files": ["**/*.hbs"], "singleQuote": false}
        ]
    })))
    .unwrap();
    Resolver::new(config, Arc::new(presets()))
}

fn bench_resolve_single_path(c: &mut Criterion) {
    let resolver = resolver();
    c.bench_function("resolve_single_path", |b| {
        b.iter(|| black_box(resolver.resolve(black_box("tests/unit/button-test.js"))));
    });
}

fn bench_resolve_many_paths(c: &mut Criterion) {
    let resolver = resolver();
    c.bench_function("resolve_many_paths", |b| {
        b.iter(|| {
            for path in PATHS {
                black_box(resolver.resolve(path).unwrap());
            }
        });
    });
}

/// Linear scan over a long override list, most of which do not match.
fn bench_resolve_many_overrides(c: &mut Criterion) {
    let overrides: Vec<serde_json::Value> = (0..200)
        .map(|i| {
            json!({
                "files": [format!("packages/pkg-{i}/**/*.{{js,ts}}")],
                "excludedFiles": [format!("packages/pkg-{i}/vendor/**")],
                "rules": {"max-len": ["error", 80 + i]}
            })
        })
        .collect();
    let config = ConfigFile::from_record(record(json!({
        "extends": "company",
        "overrides": overrides
    })))
    .unwrap();
    let resolver = Resolver::new(config, Arc::new(presets()));

    c.bench_function("resolve_many_overrides", |b| {
        b.iter(|| black_box(resolver.resolve(black_box("packages/pkg-150/src/index.ts"))));
    });
}

/// Building the resolver includes parsing every preset and compiling its
/// override patterns.
fn bench_build_resolver(c: &mut Criterion) {
    c.bench_function("build_resolver", |b| {
        b.iter(|| black_box(resolver()));
    });
}

fn bench_merge_nested(c: &mut Criterion) {
    let base = record(json!({
        "plugins": ["ember", "import"],
        "env": {"browser": true, "es6": true},
        "rules": {"semi": "error", "indent": ["error", 2], "curly": "error"}
    }));
    let patch = record(json!({
        "plugins": ["import", "qunit"],
        "env": {"qunit": true},
        "rules": {"semi": "off", "indent": ["error", 4]}
    }));

    c.bench_function("merge_nested", |b| {
        b.iter_batched(
            || (base.clone(), patch.clone()),
            |(base, patch)| black_box(merge(&base, &patch)),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_resolve_single_path,
    bench_resolve_many_paths,
    bench_resolve_many_overrides,
    bench_build_resolver,
    bench_merge_nested,
);

criterion_main!(benches);
