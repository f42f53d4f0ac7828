use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn solar16() -> Command {
    Command::cargo_bin("solar16").unwrap()
}

#[test]
fn runs_without_arguments() {
    solar16().assert().success();
}

#[test]
fn assembles_sum() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("sum.bin");

    solar16()
        .arg("assemble")
        .arg("tests/files/sum.asm")
        .arg(&dest)
        .assert()
        .success()
        .stdout(contains("13000000\n00000500\n00000a00\n23000000"));

    #[rustfmt::skip]
    let expected = [
        0x13, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x05, 0x00,
        0x00, 0x00, 0x0A, 0x00,
        0x23, 0x00, 0x00, 0x00,
    ];
    assert_eq!(std::fs::read(&dest).unwrap(), expected);
}

#[test]
fn assemble_defaults_to_bin_extension() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("prog.asm");
    std::fs::write(&src, "NOP\nHALT\n").unwrap();

    solar16().arg("assemble").arg(&src).assert().success();

    assert_eq!(
        std::fs::read(dir.path().join("prog.bin")).unwrap(),
        [0xFF, 0, 0, 0, 0x23, 0, 0, 0]
    );
}

#[test]
fn unknown_mnemonic_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("bad.bin");

    solar16()
        .arg("assemble")
        .arg("tests/files/bad_mnemonic.asm")
        .arg(&dest)
        .assert()
        .code(1)
        .stderr(contains("FOO"));

    assert!(!dest.exists());
}

#[test]
fn invalid_register_fails() {
    solar16()
        .arg("check")
        .arg("tests/files/bad_register.asm")
        .assert()
        .code(1)
        .stderr(contains("R16"));
}

#[test]
fn missing_input_fails() {
    solar16()
        .arg("assemble")
        .arg("tests/files/does_not_exist.asm")
        .assert()
        .code(1);

    solar16()
        .arg("emulate")
        .arg("tests/files/does_not_exist.bin")
        .assert()
        .code(1);
}

#[test]
fn checks_valid_source() {
    solar16()
        .arg("check")
        .arg("tests/files/countdown.asm")
        .assert()
        .success()
        .stdout(contains("no errors found"));
}

#[test]
fn emulates_assembled_binary() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("hello.bin");
    solar16()
        .arg("assemble")
        .arg("tests/files/hello.asm")
        .arg(&dest)
        .assert()
        .success();

    solar16()
        .arg("emulate")
        .arg(&dest)
        .args(["--clock", "0"])
        .assert()
        .success()
        .stdout(contains("SOLAR-16 Emulator"))
        .stdout(contains("Instruction memory:"))
        .stdout(contains("00014800"))
        .stdout(contains("Hi\n"))
        .stdout(contains("Halted"));
}

#[test]
fn emulates_source_directly() {
    solar16()
        .arg("emulate")
        .arg("tests/files/countdown.asm")
        .args(["--minimal", "--clock", "0"])
        .assert()
        .success()
        .stdout("987654321\n");
}

#[test]
fn dumps_registers() {
    solar16()
        .arg("emulate")
        .arg("tests/files/sum.asm")
        .args(["--minimal", "--registers", "--clock", "0"])
        .assert()
        .success()
        .stdout(contains("R0 15\n"))
        .stdout(contains("R15 0\n"))
        .stdout(contains("PC 12\n"))
        .stdout(contains("Z 0\n"));
}

#[test]
fn reads_input_port() {
    solar16()
        .arg("emulate")
        .arg("tests/files/echo.asm")
        .args(["--minimal", "--clock", "0"])
        .write_stdin("Zebra\nnot echoed")
        .assert()
        .success()
        .stdout("Zebra\n");
}

#[test]
fn input_end_of_stream_reads_zero() {
    solar16()
        .arg("emulate")
        .arg("tests/files/echo.asm")
        .args(["--minimal", "--clock", "0"])
        .write_stdin("ok")
        .assert()
        .success()
        .stdout("ok\n");
}

#[test]
fn unknown_opcode_faults() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("fault.bin");
    std::fs::write(&bin, [0xFF, 0, 0, 0, 0x7F, 0, 0, 0]).unwrap();

    solar16()
        .arg("emulate")
        .arg(&bin)
        .args(["--minimal", "--clock", "0"])
        .assert()
        .failure()
        .stderr(contains("0x7F").and(contains("0x0004")));
}

#[test]
fn running_past_the_end_faults() {
    solar16()
        .arg("emulate")
        .arg("tests/files/no_halt.asm")
        .args(["--minimal", "--clock", "0"])
        .assert()
        .failure()
        .stderr(contains("outside the program"));
}

#[test]
fn rejects_misaligned_binary() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("short.bin");
    std::fs::write(&bin, [0x23, 0, 0]).unwrap();

    solar16()
        .arg("emulate")
        .arg(&bin)
        .assert()
        .failure()
        .stderr(contains("not aligned"));
}

#[test]
fn clock_from_environment() {
    solar16()
        .env("SOLAR_CLOCK_HZ", "0")
        .arg("emulate")
        .arg("tests/files/sum.asm")
        .args(["--minimal", "--registers"])
        .assert()
        .success()
        .stdout(contains("R0 15\n"));

    solar16()
        .env("SOLAR_CLOCK_HZ", "fast")
        .arg("emulate")
        .arg("tests/files/sum.asm")
        .assert()
        .failure()
        .stderr(contains("SOLAR_CLOCK_HZ"));
}

#[test]
fn traces_execution() {
    solar16()
        .env("SOLAR_TRACE", "1")
        .arg("emulate")
        .arg("tests/files/sum.asm")
        .args(["--minimal", "--clock", "0"])
        .assert()
        .success()
        .stderr(contains("0004  00000500  ADD"))
        .stderr(contains("000c  23000000  HALT"));
}
