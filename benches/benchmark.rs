use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hspc::hypersplit::Forest;
use hspc::rfg;
use hspc::simulation::Simulation;
use hspc::{Partition, RuleSet};

fn build_forest(rule_set: RuleSet) -> Forest {
    let partition = if rule_set.rule_num() > 2 {
        rfg::group(&rule_set).expect("grouping a non-empty rule set never fails")
    } else {
        Partition::single(rule_set)
    };
    Forest::build(&partition).expect("building over a non-empty partition never fails")
}

fn benchmark_classification(c: &mut Criterion) {
    let mut sim = Simulation::new(42);

    let rule_counts = [100, 300, 500, 700, 900, 1000, 3000, 5000, 7000, 9000, 10000, 20000];

    let mut group = c.benchmark_group("Classification");
    group.sample_size(50);

    for &n_rules in &rule_counts {
        let rules = sim.generate_rules(n_rules);
        let packets = sim.generate_packets(1000);
        let rule_set = RuleSet::from_rules(rules);

        let linear = rule_set.clone();
        let forest = build_forest(rule_set);

        group.bench_with_input(BenchmarkId::new("Linear", n_rules), &packets, |b, packets| {
            b.iter(|| {
                for p in packets {
                    linear.classify_linear(p);
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("HyperSplit", n_rules), &packets, |b, packets| {
            b.iter(|| {
                for p in packets {
                    forest.search(p);
                }
            })
        });
    }
    group.finish();
}

fn benchmark_grouping(c: &mut Criterion) {
    let mut sim = Simulation::new(7);
    let rule_counts = [100, 1000, 10000];

    let mut group = c.benchmark_group("Grouping");
    for &n_rules in &rule_counts {
        let rules = sim.generate_rules(n_rules);
        let rule_set = RuleSet::from_rules(rules);

        group.bench_with_input(BenchmarkId::new("RFG", n_rules), &rule_set, |b, rule_set| {
            b.iter(|| rfg::group(rule_set).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_classification, benchmark_grouping);
criterion_main!(benches);
