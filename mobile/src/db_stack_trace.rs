use crate::models::{NewStackTrace, StackTrace};
use anyhow::{Context, Result};
use diesel::prelude::*;

/// Insert a crash trace
pub fn insert_trace(conn: &mut SqliteConnection, new_trace: &NewStackTrace) -> Result<()> {
    use crate::schema::stack_traces::dsl::*;

    diesel::insert_into(stack_traces)
        .values(new_trace)
        .execute(conn)
        .context("Failed to insert stack trace")?;

    Ok(())
}

/// All stored traces, newest first
pub fn get_all_traces(conn: &mut SqliteConnection) -> Result<Vec<StackTrace>> {
    use crate::schema::stack_traces::dsl::*;

    let results = stack_traces
        .order((timestamp.desc(), id.desc()))
        .select(StackTrace::as_select())
        .load(conn)
        .context("Failed to query stack traces")?;

    Ok(results)
}

pub fn delete_trace(conn: &mut SqliteConnection, trace_id: i32) -> Result<usize> {
    use crate::schema::stack_traces::dsl::*;

    let count = diesel::delete(stack_traces.find(trace_id))
        .execute(conn)
        .context("Failed to delete stack trace")?;

    Ok(count)
}
