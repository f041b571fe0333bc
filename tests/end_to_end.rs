//! End-to-end scenarios S1-S6 and invariants 5-7 (spec §8), driving
//! `Preprocessor` + `Assembler` over literal JCL text.

use jclnorm::assemble::Assembler;
use jclnorm::persist::{PersistenceAdapter, RecordingAdapter};
use jclnorm::preprocess::Preprocessor;
use jclnorm::resolve::FilesystemResolver;

fn run(text: &str) -> Vec<jclnorm::assemble::Step> {
    let resolver = FilesystemResolver { ext: None };
    let mut pp = Preprocessor::new(vec![], &resolver);
    let events = pp.process_text(text);
    Assembler::assemble(&events)
}

#[test]
fn s1_pgm_step() {
    let steps = run("//STEP1 EXEC PGM=IEFBR14");
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].step_name, "STEP1");
    assert_eq!(steps[0].program_name.as_deref(), Some("IEFBR14"));
    assert_eq!(steps[0].proc_step_name, None);
    assert_eq!(steps[0].proc_name, None);
    assert!(steps[0].dds.is_empty());
}

#[test]
fn s2_disp_tuple() {
    let steps = run("//STEP2 EXEC PGM=X\n//OUT DD DSN=A.B,DISP=(NEW,CATLG,DELETE)");
    let rows = jclnorm::persist::flatten_allocations(&steps[0].dds);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].dsn, "A.B");
    assert_eq!(rows[0].disp_status.as_deref(), Some("NEW"));
    assert_eq!(rows[0].disp_normal_term.as_deref(), Some("CATLG"));
    assert_eq!(rows[0].disp_abnormal_term.as_deref(), Some("DELETE"));
    assert_eq!(rows[0].allocation_offset, 1);
}

#[test]
fn s3_procedure_expansion() {
    let text = "\
//MYPROC PROC P=FOO
//S1 EXEC PGM=&P
// PEND
//CALL EXEC MYPROC,P=BAR";
    let steps = run(text);
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].step_name, "CALL");
    assert_eq!(steps[0].proc_name.as_deref(), Some("MYPROC"));
    assert_eq!(steps[0].proc_step_name.as_deref(), Some("S1"));
    assert_eq!(steps[0].program_name.as_deref(), Some("BAR"));
}

#[test]
fn s4_in_stream_payload() {
    // Also invariant 7 (default delimiter).
    let text = "\
//STEP EXEC PGM=X
//SYSIN DD *
HELLO
WORLD
//NEXT DD DUMMY";
    let steps = run(text);
    let rows = jclnorm::persist::flatten_allocations(&steps[0].dds);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].dd_name, "SYSIN");
    assert_eq!(rows[0].instream_ref.as_deref(), Some("HELLO\nWORLD"));
    assert_eq!(rows[0].dsn, "(input stream)");
    assert_eq!(rows[1].dd_name, "NEXT");
    assert!(rows[1].is_dummy);
    assert_eq!(rows[1].dsn, "(dummy)");
}

#[test]
fn invariant7_custom_delimiter_inclusive() {
    let text = "\
//STEP EXEC PGM=X
//SYSIN DD *,DLM=$$
HELLO
$$
//NEXT DD DUMMY";
    let steps = run(text);
    let rows = jclnorm::persist::flatten_allocations(&steps[0].dds);
    assert_eq!(rows[0].instream_ref.as_deref(), Some("HELLO"));
}

#[test]
fn invariant7_custom_delimiter_overrides_default_terminator() {
    // A payload line starting with `//` or `/*` is ordinary data while a
    // custom DLM is active; only the exact DLM line terminates capture.
    let text = "\
//STEP EXEC PGM=X
//SYSIN DD *,DLM=$$
//NOT A STATEMENT
/* NOT A COMMENT
$$
//NEXT DD DUMMY";
    let steps = run(text);
    let rows = jclnorm::persist::flatten_allocations(&steps[0].dds);
    assert_eq!(
        rows[0].instream_ref.as_deref(),
        Some("//NOT A STATEMENT\n/* NOT A COMMENT")
    );
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].dd_name, "NEXT");
}

#[test]
fn s5_invariant5_dd_concatenation() {
    let text = "\
//STEP EXEC PGM=X
//IN DD DSN=A
// DD DSN=B
// DD DSN=C";
    let steps = run(text);
    let rows = jclnorm::persist::flatten_allocations(&steps[0].dds);
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.dd_name, "IN");
    }
    assert_eq!(
        rows.iter().map(|r| r.allocation_offset).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(
        rows.iter().map(|r| r.dsn.as_str()).collect::<Vec<_>>(),
        vec!["A", "B", "C"]
    );
}

#[test]
fn s6_include() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("SUB"), "//X EXEC PGM=Y").unwrap();

    let resolver = FilesystemResolver { ext: None };
    let libs = vec![dir.path().to_string_lossy().into_owned()];
    let mut pp = Preprocessor::new(libs, &resolver);
    let events = pp.process_text("// INCLUDE MEMBER=SUB");
    let steps = Assembler::assemble(&events);

    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].program_name.as_deref(), Some("Y"));
}

#[test]
fn invariant6_step_numbering_continues_across_inserts() {
    let mut adapter = RecordingAdapter::new();
    let first_steps = run("//A EXEC PGM=X\n//B EXEC PGM=Y");
    let first = adapter.insert_project("PROJ", &first_steps).unwrap();
    assert_eq!(first.step_count, 2);

    let second_steps = run("//C EXEC PGM=Z");
    adapter.insert_project("PROJ", &second_steps).unwrap();

    assert_eq!(adapter.steps[0].step_id, 1);
    assert_eq!(adapter.steps[1].step_id, 2);
    assert_eq!(adapter.steps[2].step_id, 3);
    assert_eq!(adapter.steps[2].relative_step, "X0000001");
}
