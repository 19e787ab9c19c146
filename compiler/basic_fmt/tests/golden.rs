//! Golden dump tests: the exact output strings are the contract.

use basic_parse::parse_program;
use pretty_assertions::assert_eq;

fn dump(src: &str) -> String {
    let program = parse_program(src, 1, None);
    basic_fmt::dump(&program)
}

#[test]
fn test_open_and_end() {
    assert_eq!(
        dump("10 OPEN \"foo.txt\" FOR INPUT AS #1\n20 END\n"),
        "10: (OPEN mode=INPUT(0) path=\"foo.txt\" channel=#1)\n20: (END)\n"
    );
}

#[test]
fn test_open_modes_carry_ordinals() {
    assert_eq!(
        dump("10 OPEN F$ FOR OUTPUT AS #2\n20 END\n"),
        "10: (OPEN mode=OUTPUT(1) path=F$ channel=#2)\n20: (END)\n"
    );
    assert_eq!(
        dump("10 OPEN F$ FOR APPEND AS #2\n20 END\n"),
        "10: (OPEN mode=APPEND(2) path=F$ channel=#2)\n20: (END)\n"
    );
    assert_eq!(
        dump("10 OPEN F$ FOR BINARY AS #2\n20 END\n"),
        "10: (OPEN mode=BINARY(3) path=F$ channel=#2)\n20: (END)\n"
    );
    assert_eq!(
        dump("10 OPEN F$ FOR RANDOM AS #2\n20 END\n"),
        "10: (OPEN mode=RANDOM(4) path=F$ channel=#2)\n20: (END)\n"
    );
}

#[test]
fn test_close() {
    assert_eq!(
        dump("10 CLOSE #1\n20 END\n"),
        "10: (CLOSE channel=#1)\n20: (END)\n"
    );
}

#[test]
fn test_print_channel() {
    assert_eq!(
        dump("10 PRINT #1, X, Y\n20 END\n"),
        "10: (PRINT# channel=#1 args=[X Y])\n20: (END)\n"
    );
}

#[test]
fn test_write_channel_no_newline() {
    assert_eq!(
        dump("10 WRITE #1, X;\n20 END\n"),
        "10: (WRITE# channel=#1 args=[X] no-newline)\n20: (END)\n"
    );
}

#[test]
fn test_line_input_channel() {
    assert_eq!(
        dump("10 LINE INPUT #1, A$\n20 END\n"),
        "10: (LINE-INPUT# channel=#1 target=A$)\n20: (END)\n"
    );
}

#[test]
fn test_goto_numeric() {
    assert_eq!(dump("10 GOTO 200\n20 END\n"), "10: (GOTO 200)\n20: (END)\n");
}

#[test]
fn test_goto_named_label() {
    assert_eq!(
        dump("10 GOTO Start\n20 END\nStart:\n30 END\n"),
        "10: (GOTO 1000000)\n20: (END)\n1000000: (LABEL)\n30: (END)\n"
    );
}

#[test]
fn test_gosub() {
    assert_eq!(
        dump("30 GOSUB 200\n40 END\n"),
        "30: (GOSUB 200)\n40: (END)\n"
    );
}

#[test]
fn test_on_error_and_resume_variants() {
    assert_eq!(
        dump("10 ON ERROR GOTO 200\n20 END\n"),
        "10: (ON-ERROR GOTO 200)\n20: (END)\n"
    );
    assert_eq!(
        dump("10 ON ERROR GOTO 0\n20 END\n"),
        "10: (ON-ERROR GOTO 0)\n20: (END)\n"
    );
    assert_eq!(dump("10 RESUME\n20 END\n"), "10: (RESUME)\n20: (END)\n");
    assert_eq!(
        dump("10 RESUME NEXT\n20 END\n"),
        "10: (RESUME NEXT)\n20: (END)\n"
    );
    assert_eq!(
        dump("10 RESUME 400\n20 END\n"),
        "10: (RESUME 400)\n20: (END)\n"
    );
}

#[test]
fn test_select_case_golden() {
    let src = "10 SELECT CASE X\n\
               20 CASE 1, 2\n\
               30 PRINT 1\n\
               40 CASE 3\n\
               50 PRINT 3\n\
               60 CASE ELSE\n\
               70 PRINT 0\n\
               80 END SELECT\n";
    assert_eq!(
        dump(src),
        "10: (SELECT CASE X (CASE 1 2) {30:(PRINT 1)}) (CASE 3) {50:(PRINT 3)}) \
         (CASE ELSE) {70:(PRINT 0)}))\n"
    );
}

#[test]
fn test_representative_program_dump() {
    let src = "\
5 FUNCTION FNRESULT(A, ARR()) AS DOUBLE
501 RETURN A
502 END FUNCTION
6 SUB DOIT(MSG$, VALUES())
601 PRINT \"HELLO\"
602 END SUB
10 PRINT 42, 3.5 \"HI\";
20 DIM ARR(10) AS DOUBLE
30 DIM S$ AS STRING
37 REDIM ARR(20)
40 RANDOMIZE 123
50 INPUT \"Value?\", N
70 WHILE NOT DONE
71 PRINT 1
72 WEND
80 FOR I = 1 TO 5 STEP 2
81 PRINT I
82 NEXT I
87 EXIT DO
100 GOTO 200
120 END
";
    let expected = "\
5: (FUNCTION FNRESULT qualifiedName: <null> RET F64 (A ARR()) AS DOUBLE {501:(RETURN A)})\n\
6: (SUB DOIT qualifiedName: <null> (MSG$ VALUES()) {601:(PRINT \"HELLO\")})\n\
10: (PRINT 42 , 3.5 \"HI\" ;)\n\
20: (DIM ARR 10 AS F64)\n\
30: (DIM S$ AS STR)\n\
37: (REDIM ARR 20)\n\
40: (RANDOMIZE 123)\n\
50: (INPUT \"Value?\", N)\n\
70: (WHILE (NOT DONE) {71:(PRINT 1)})\n\
80: (FOR I = 1 TO 5 STEP 2 {81:(PRINT I)})\n\
87: (EXIT DO)\n\
100: (GOTO 200)\n\
120: (END)\n";
    assert_eq!(dump(src), expected);
}

#[test]
fn test_if_with_elseif_and_sequence() {
    let src = "60 IF A > 0 THEN LET B = TRUE : GOTO 100 ELSE PRINT \"ZERO\"\n70 END\n";
    assert_eq!(
        dump(src),
        "60: (IF (> A 0) THEN (SEQ (LET B TRUE) (GOTO 100)) ELSE (PRINT \"ZERO\"))\n70: (END)\n"
    );
}

#[test]
fn test_do_post_until() {
    let src = "85 DO\n86 PRINT \"LOOP\"\n87 LOOP UNTIL DONE\n90 END\n";
    assert_eq!(
        dump(src),
        "85: (DO post UNTIL DONE {86:(PRINT \"LOOP\")})\n90: (END)\n"
    );
}

#[test]
fn test_do_pre_none() {
    let src = "10 DO\n20 PRINT 1\n30 LOOP\n40 END\n";
    assert_eq!(dump(src), "10: (DO pre NONE {20:(PRINT 1)})\n40: (END)\n");
}

#[test]
fn test_builtin_call_rendering() {
    let src = "20 LET X = SQR(1 + 2.5)\n30 END\n";
    assert_eq!(dump(src), "20: (LET X (SQR (+ 1 2.5)))\n30: (END)\n");
}

#[test]
fn test_array_target_and_call_args() {
    let src = "10 DIM ARR(4)\n20 LET ARR(I) = FNRESULT(B, 2)\n30 END\n";
    assert_eq!(
        dump(src),
        "10: (DIM ARR 4)\n20: (LET ARR(I) (FNRESULT B 2))\n30: (END)\n"
    );
}

#[test]
fn test_seek_and_terminal_statements() {
    assert_eq!(
        dump("10 SEEK #1, 42\n20 CLS\n30 BEEP\n40 CURSOR OFF\n50 ALTSCREEN ON\n60 END\n"),
        "10: (SEEK channel=#1 pos=42)\n20: (CLS)\n30: (BEEP)\n40: (CURSOR OFF)\n\
         50: (ALTSCREEN ON)\n60: (END)\n"
    );
}

#[test]
fn test_color_locate_sleep_optionals() {
    assert_eq!(
        dump("10 COLOR 7\n20 LOCATE 2, 3\n30 SLEEP\n40 END\n"),
        "10: (COLOR 7 <null>)\n20: (LOCATE 2 3)\n30: (SLEEP <null>)\n40: (END)\n"
    );
}

#[test]
fn test_try_catch_dump() {
    let src = "10 TRY\n20 PRINT 1\n30 CATCH e\n40 PRINT ERR()\n50 END TRY\n60 END\n";
    assert_eq!(
        dump(src),
        "10: (TRY {20:(PRINT 1)}) (CATCH e) {40:(PRINT (ERR))}))\n60: (END)\n"
    );
}

#[test]
fn test_class_dump() {
    let src = "\
10 CLASS Point IMPLEMENTS Geo.Shape
20 DIM X AS INTEGER
30 STATIC COUNT AS INTEGER
40 METHOD Norm() AS DOUBLE
50 RETURN 0
60 END METHOD
70 END CLASS
80 END
";
    assert_eq!(
        dump(src),
        "10: (CLASS Point qualifiedName: <null> (FIELDS X:I64 STATIC COUNT:I64) \
         (IMPLEMENTS Geo.Shape) {40:(METHOD Norm RET F64 () {50:(RETURN 0)})})\n80: (END)\n"
    );
}

#[test]
fn test_type_and_using_and_interface() {
    let src = "\
10 TYPE Vec
20 X AS DOUBLE
30 Y AS DOUBLE
40 END TYPE
50 USING G = Geo.Shapes
60 INTERFACE Geo.Shape
70 METHOD Area() AS DOUBLE
80 END INTERFACE
90 END
";
    assert_eq!(
        dump(src),
        "10: (TYPE Vec (FIELDS X:F64 Y:F64))\n\
         60: (INTERFACE Geo.Shape {70:(METHOD Area RET F64 () {})})\n\
         50: (USING G = Geo.Shapes)\n90: (END)\n"
    );
}

#[test]
fn test_member_access_and_new() {
    let src = "10 LET P = NEW Geo.Point(1, 2)\n20 P.Move(3)\n30 END\n";
    assert_eq!(
        dump(src),
        "10: (LET P (NEW Geo.Point 1 2))\n20: (CALL (P.Move 3))\n30: (END)\n"
    );
}

#[test]
fn test_is_as_addressof() {
    let src = "10 LET B = P IS Geo.Point\n20 LET Q = P AS Geo.Point\n30 LET H = ADDRESSOF Handler\n40 END\n";
    assert_eq!(
        dump(src),
        "10: (LET B (IS P Geo.Point))\n20: (LET Q (AS P Geo.Point))\n\
         30: (LET H (ADDRESSOF Handler))\n40: (END)\n"
    );
}

#[test]
fn test_swap_shared_static_delete() {
    let src = "10 SWAP A, B\n20 SHARED A, B\n30 STATIC N\n40 DELETE P\n50 END\n";
    assert_eq!(
        dump(src),
        "10: (SWAP A B)\n20: (SHARED A B)\n30: (STATIC N)\n40: (DELETE P)\n50: (END)\n"
    );
}

#[test]
fn test_dump_is_stable_across_runs() {
    let src = "10 SELECT CASE X\n20 CASE 1, 2\n30 PRINT 1\n40 END SELECT\n50 END\n";
    assert_eq!(dump(src), dump(src));
}

mod roundtrip {
    use super::*;
    use basic_fold::fold_constants;
    use proptest::prelude::*;

    proptest! {
        /// Dumps are deterministic for arbitrary literal programs, before
        /// and after folding.
        #[test]
        fn dump_stable_under_fold_idempotence(a in -1000i64..1000, b in -1000i64..1000) {
            let src = format!("10 LET X = {a} + {b}\n20 PRINT X\n30 END\n");
            let mut program = parse_program(&src, 1, None);
            fold_constants(&mut program);
            let first = basic_fmt::dump(&program);
            fold_constants(&mut program);
            let second = basic_fmt::dump(&program);
            prop_assert_eq!(first, second);
        }
    }
}
