use pretty_assertions::assert_eq;
use smil::{run, Completion};

fn output(source: &str, inputs: &[&str]) -> String {
    let execution = run(source, inputs).expect("Execution failed");
    assert_eq!(execution.completion, Completion::Finished);
    execution.output
}

#[test]
fn test_hello_world() {
    assert_eq!(output("<3 o/ </3", &[]), "Hello, world!\n");
    assert_eq!(output("o/ :P :$ :D", &["Ada"]), "Hello, Ada!\nAda\n");
}

#[test]
fn test_program_markers_are_optional() {
    assert_eq!(output(":P :$ :D", &["7"]), "7\n");
    assert_eq!(output("<3\n:P :$ :D\n</3", &["7"]), "7\n");
}

#[test]
fn test_precedence() {
    assert_eq!(output(":P :$ :+ :$:$ :* :$:$:$ :D", &["2", "3", "4"]), "14\n");
    assert_eq!(output(":P :$ :* :$:$ :+ :$:$:$ :D", &["2", "3", "4"]), "10\n");
    // && and || bind tighter than * and +
    assert_eq!(output(":P :$ :+ :$:$ && :$:$:$ :D", &["1", "6", "3"]), "3\n");
}

#[test]
fn test_left_associativity() {
    assert_eq!(output(":P :$ :- :$:$ :- :$:$:$ :D", &["10", "3", "2"]), "5\n");
    assert_eq!(output(":P :$ :/ :$:$ :/ :$:$:$ :D", &["100", "5", "2"]), "10\n");
}

#[test]
fn test_integer_division_truncates() {
    assert_eq!(output(":P :$ :/ :$:$ :$ :% :$:$ :D", &["-7", "2"]), "-3 -1\n");
}

#[test]
fn test_string_operators() {
    assert_eq!(output(":P :$ :* :$:$ :D", &["ab", "3"]), "ababab\n");
    assert_eq!(output(":P :$ :- :$:$ :D", &["hello world", "o"]), "hell wrld\n");
    assert_eq!(output(":P :$ :- :$:$ :D", &["hello", "2"]), "hel\n");
    assert_eq!(output(":P :$ :/ :$:$ :D", &["abcdef", "2"]), "abc\n");
    assert_eq!(output(":P :$ :% :$:$ :D", &["abcdef", "2"]), "cdefab\n");
    assert_eq!(output(":P :$ :+ :$:$ :D", &["3", "apples"]), "3apples\n");
}

#[test]
fn test_string_operators_clamp() {
    assert_eq!(output(":P :$ :- :$:$ :D", &["abc", "10"]), "\n");
    assert_eq!(output(":P :$ :* :$:$ :D", &["abc", "-1"]), "\n");
}

#[test]
fn test_length() {
    assert_eq!(output(":P :L :$ :D", &["héllo"]), "5\n");
    assert_eq!(output(":P :L :$ :D", &["1234"]), "4\n");
}

#[test]
fn test_variables_and_assignment() {
    let source = r#"
        :# copy the first input around
        :( greeting :) := :$
        :( copy :) := :( greeting :)
        :P :( copy :) :( untouched :) :D
    "#;
    assert_eq!(output(source, &["hi"]), "hi 0\n");
}

#[test]
fn test_inverted_assignment() {
    let source = "
        ;( not_a :) := :$
        :( also_not_a :) := ;( first :)
        :( first :) := :$
        ;( both :) := ;( first :)
        :P :( not_a :) :( also_not_a :) :( both :) :D
    ";
    assert_eq!(output(source, &["0"]), "1 1 0\n");
    assert_eq!(output(source, &["9"]), "0 1 1\n");
}

#[test]
fn test_named_variables() {
    let source = ":( :( :$ :) :) := :$:$ :P :( counter :) :D";
    assert_eq!(output(source, &["counter", "42"]), "42\n");
}

#[test]
fn test_stack_is_last_in_first_out() {
    let source = "
        :^ :$ :^ :$:$ :^ :$:$:$
        :v :( a :) :v :( b :) :v :( c :)
        :P :( a :) :( b :) :( c :) :D
    ";
    assert_eq!(output(source, &["x", "y", "z"]), "z y x\n");
}

#[test]
fn test_loop_counts_down() {
    let source = r#"
        <3
        :( n :) := :$
        8) :( n :) 8|
            :P :( n :) :D
            :( n :) := :( n :) :- :$:$
        8(
            :P :( never :) :D
        8D
        :P :( n :) :D
        </3
    "#;
    assert_eq!(output(source, &["3", "1"]), "3\n2\n1\n0\n");
}

#[test]
fn test_loop_else_runs_when_condition_starts_false() {
    let source = "8) :$ 8| :P :$ :D 8( :P :$:$ :D 8D";
    assert_eq!(output(source, &["0", "skipped"]), "skipped\n");
    assert_eq!(output(source, &["-4", "skipped"]), "skipped\n");
}

#[test]
fn test_exit_stops_the_program() {
    let execution = run("o/ :X o/", &[]).expect("Execution failed");
    assert_eq!(execution.completion, Completion::Exit(0));
    assert_eq!(execution.output, "Hello, world!\n");
}

#[test]
fn test_comments_and_nops() {
    let source = ":# :P :$ :D is ignored\n:| :P :$ :D :|";
    assert_eq!(output(source, &["shown"]), "shown\n");
}

#[test]
fn test_code_after_program_end_is_ignored() {
    assert_eq!(output("<3 o/ </3 o/", &[]), "Hello, world!\n");
}

#[test]
fn test_demo_programs() {
    let countdown = include_str!("../demos/countdown.smil");
    assert_eq!(output(countdown, &["2"]), "2\n1\n");
    assert_eq!(output(countdown, &["zero"]), "zero\n");

    let hello = include_str!("../demos/hello.smil");
    assert_eq!(output(hello, &["Ada"]), "Hello, Ada!\n3\n");

    let stack = include_str!("../demos/stack.smil");
    assert_eq!(output(stack, &["a", "b"]), "b a\n");
}

#[test]
fn test_pop_shares_the_pushed_object() {
    let source = ":(x:) := :$ :^ :(x:) :v :(b:) :(x:) := :$:$ :P :(b:) :D";
    assert_eq!(output(source, &["1", "2"]), "2\n");
}

#[test]
fn test_pop_as_a_value() {
    assert_eq!(output(":^ :$ :P :v :(x:) :(x:) :D", &["7"]), "7 7\n");

    let source = "
        :^ :$ :^ :$:$ :^ :$:$:$
        8) :v :( n :) 8|
            :P :( n :) :D
        8( 8D
    ";
    assert_eq!(output(source, &["0", "1", "2"]), "2\n1\n");
}

#[test]
fn test_pop_into_named_variable() {
    let source = ":^ :$:$ :v :( :( :$ :) :) :P :( slot :) :D";
    assert_eq!(output(source, &["slot", "9"]), "9\n");
}

#[test]
fn test_stack_grows_past_one_chunk() {
    let source = r#"
        :( one :) := :L :( zero :)
        :( n :) := :$
        :^ :( zero :)
        8) :( n :) 8|
            :^ :( n :) :+ :( zero :)
            :( n :) := :( n :) :- :( one :)
        8( 8D
        :( total :) := :( zero :)
        8) :v :( k :) 8|
            :( total :) := :( total :) :+ :( k :)
        8( 8D
        :P :( total :) :D
    "#;
    assert_eq!(output(source, &["40"]), "820\n");
}
