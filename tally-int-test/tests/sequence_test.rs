use tally::doc;
use tally::errors::{ErrorKind, TallyResult};
use tally_int_test::test_util::{
    cleanup, create_fjall_context, create_fjall_upsert_context, create_memory_context,
    create_memory_upsert_context, run_test, TestContext,
};

#[ctor::ctor]
fn init() {
    colog::init();
}

fn first_value_is_one(ctx: TestContext) -> TallyResult<()> {
    let sequences = ctx.tally().sequences();
    assert!(sequences.provision("cities")?);
    assert_eq!(sequences.current("cities")?, 0);
    assert_eq!(sequences.next("cities")?, 1);
    Ok(())
}

fn values_increase_by_one(ctx: TestContext) -> TallyResult<()> {
    let sequences = ctx.tally().sequences();
    sequences.provision("cities")?;

    let mut last = 0;
    for _ in 0..100 {
        let value = sequences.next("cities")?;
        assert_eq!(value, last + 1);
        last = value;
    }
    assert_eq!(sequences.current("cities")?, 100);
    Ok(())
}

fn names_are_isolated(ctx: TestContext) -> TallyResult<()> {
    let sequences = ctx.tally().sequences();
    sequences.provision("cities")?;
    sequences.provision("orders")?;

    for _ in 0..5 {
        sequences.next("cities")?;
    }
    assert_eq!(sequences.current("orders")?, 0);
    assert_eq!(sequences.next("orders")?, 1);
    assert_eq!(sequences.next("cities")?, 6);
    Ok(())
}

fn strict_policy_requires_provisioning(ctx: TestContext) -> TallyResult<()> {
    let sequences = ctx.tally().sequences();
    let err = sequences.next("cities").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::NotFound);
    assert_eq!(err.sequence_name(), Some("cities"));
    assert!(sequences.names()?.is_empty());
    Ok(())
}

fn upsert_policy_creates_on_first_use(ctx: TestContext) -> TallyResult<()> {
    let sequences = ctx.tally().sequences();
    assert_eq!(sequences.next("cities")?, 1);
    assert_eq!(sequences.next("cities")?, 2);
    assert_eq!(sequences.names()?, vec!["cities"]);
    Ok(())
}

fn reset_restarts_the_lifecycle(ctx: TestContext) -> TallyResult<()> {
    let sequences = ctx.tally().sequences();
    sequences.provision("cities")?;
    sequences.next("cities")?;
    sequences.next("cities")?;

    assert!(sequences.reset("cities")?);
    assert_eq!(
        sequences.current("cities").unwrap_err().kind(),
        &ErrorKind::NotFound
    );
    sequences.provision("cities")?;
    assert_eq!(sequences.next("cities")?, 1);
    Ok(())
}

fn names_are_listed_in_order(ctx: TestContext) -> TallyResult<()> {
    let sequences = ctx.tally().sequences();
    for name in ["orders", "cities", "invoices"] {
        sequences.provision(name)?;
    }
    assert_eq!(sequences.names()?, vec!["cities", "invoices", "orders"]);
    Ok(())
}

fn assign_id_mints_record_ids(ctx: TestContext) -> TallyResult<()> {
    let sequences = ctx.tally().sequences();
    sequences.provision("cities")?;

    let mut cities = vec![
        doc! { name: "Oslo" },
        doc! { name: "Bergen" },
        doc! { name: "Trondheim" },
    ];
    for city in cities.iter_mut() {
        sequences.assign_id("cities", city)?;
    }
    let ids: Vec<u64> = cities
        .iter()
        .filter_map(|city| city.get("id").as_u64())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let mut existing = doc! { id: 10, name: "Stavanger" };
    let err = sequences.assign_id("cities", &mut existing).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    assert_eq!(sequences.current("cities")?, 3);
    Ok(())
}

fn blank_names_are_rejected(ctx: TestContext) -> TallyResult<()> {
    let sequences = ctx.tally().sequences();
    for name in ["", " ", "\t"] {
        assert_eq!(
            sequences.next(name).unwrap_err().kind(),
            &ErrorKind::InvalidName
        );
        assert_eq!(
            sequences.provision(name).unwrap_err().kind(),
            &ErrorKind::InvalidName
        );
    }
    Ok(())
}

#[test]
fn test_first_value_is_one() {
    run_test(create_memory_context, first_value_is_one, cleanup);
    run_test(create_fjall_context, first_value_is_one, cleanup);
}

#[test]
fn test_values_increase_by_one() {
    run_test(create_memory_context, values_increase_by_one, cleanup);
    run_test(create_fjall_context, values_increase_by_one, cleanup);
}

#[test]
fn test_names_are_isolated() {
    run_test(create_memory_context, names_are_isolated, cleanup);
    run_test(create_fjall_context, names_are_isolated, cleanup);
}

#[test]
fn test_strict_policy_requires_provisioning() {
    run_test(create_memory_context, strict_policy_requires_provisioning, cleanup);
    run_test(create_fjall_context, strict_policy_requires_provisioning, cleanup);
}

#[test]
fn test_upsert_policy_creates_on_first_use() {
    run_test(create_memory_upsert_context, upsert_policy_creates_on_first_use, cleanup);
    run_test(create_fjall_upsert_context, upsert_policy_creates_on_first_use, cleanup);
}

#[test]
fn test_reset_restarts_the_lifecycle() {
    run_test(create_memory_context, reset_restarts_the_lifecycle, cleanup);
    run_test(create_fjall_context, reset_restarts_the_lifecycle, cleanup);
}

#[test]
fn test_names_are_listed_in_order() {
    run_test(create_memory_context, names_are_listed_in_order, cleanup);
    run_test(create_fjall_context, names_are_listed_in_order, cleanup);
}

#[test]
fn test_assign_id_mints_record_ids() {
    run_test(create_memory_context, assign_id_mints_record_ids, cleanup);
    run_test(create_fjall_context, assign_id_mints_record_ids, cleanup);
}

#[test]
fn test_blank_names_are_rejected() {
    run_test(create_memory_upsert_context, blank_names_are_rejected, cleanup);
    run_test(create_fjall_upsert_context, blank_names_are_rejected, cleanup);
}
