use criterion::{Criterion, black_box, criterion_group, criterion_main};

use astguard_rules::{Discard, Filter, Predicate, RuleEngine, RuleSet, RuleSpec, Target};
use astguard_syntax::{CheckedFile, Location};

fn input(functions: usize) -> CheckedFile {
    let mut text = String::from("package bench\n\nvar sink interface{}\n\n");
    for i in 0..functions {
        text.push_str(&format!(
            "func f{i}(a int, b int) int {{\n\tvar t int = a + {i}\n\tsink = t * 2\n\tif a == a {{\n\t\treturn b\n\t}}\n\treturn (a + b) + 1\n}}\n\n"
        ));
    }
    CheckedFile::parse("bench.go", text).expect("benchmark input must check")
}

fn spec(name: &str, pattern: &str, filter: Option<Filter>) -> RuleSpec {
    RuleSpec {
        name: name.into(),
        patterns: vec![pattern.into()],
        filter,
        report: "$$".into(),
        location: Location::new("rules.yaml", 1),
        ..RuleSpec::default()
    }
}

fn engine() -> RuleEngine {
    let is_const = |name: &str| -> Filter {
        Predicate::IsConst {
            capture: name.into(),
        }
        .into()
    };
    let rules = RuleSet::compile(vec![
        spec("self-compare", "$x == $x", None),
        spec(
            "const-add",
            "$x + $y",
            Some(Filter::And(vec![is_const("x"), is_const("y")])),
        ),
        spec(
            "int-mul",
            "$x * $_",
            Some(Predicate::type_is("x", "int").expect("valid type").into()),
        ),
        spec("return-paren", "return ($x)", None),
    ])
    .expect("benchmark rules must compile");
    RuleEngine::new(rules)
}

fn bench_run(c: &mut Criterion) {
    let engine = engine();
    for functions in [10, 100] {
        let file = input(functions);
        c.bench_function(&format!("run_{functions}_functions"), |b| {
            b.iter(|| engine.run(black_box(Target::from(&file)), &Discard, &Discard));
        });
    }
}

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile_rules", |b| b.iter(|| black_box(engine())));
}

criterion_group!(benches, bench_run, bench_compile);
criterion_main!(benches);
